/// What an inbound message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Subscribe,
    Update,
    Unsubscribe,
}

const PREFIXES: [(&str, Command); 3] = [
    ("[op] subscribe", Command::Subscribe),
    ("[op] update", Command::Update),
    ("[op] unsubscribe", Command::Unsubscribe),
];

/// Classify by subject prefix after trimming. Matching is case-sensitive;
/// anything else is `None` and gets ignored.
#[must_use]
pub fn classify(subject: &str) -> Option<Command> {
    let subject = subject.trim();
    PREFIXES
        .iter()
        .find(|(prefix, _)| subject.starts_with(prefix))
        .map(|(_, command)| *command)
}
