//! Confirmation mail bodies.

use {askama::Template, operator_store::Subscriber};

use crate::{Result, duration::format_interval};

pub const SUBSCRIBE_SUBJECT: &str = "Subscription confirmed";
pub const UPDATE_SUBJECT: &str = "Information updated";
pub const UNSUBSCRIBE_SUBJECT: &str = "Unsubscribe confirmed";

#[derive(Template)]
#[template(path = "confirm-subscribe.html", escape = "html")]
struct SubscribeTemplate<'a> {
    interval: &'a str,
    handle: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "confirm-update.html", escape = "html")]
struct UpdateTemplate<'a> {
    interval: &'a str,
    handle: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "confirm-unsubscribe.html", escape = "html")]
struct UnsubscribeTemplate;

pub fn render_subscribed(subscriber: &Subscriber) -> Result<String> {
    let interval = format_interval(subscriber.interval);
    Ok(SubscribeTemplate {
        interval: &interval,
        handle: subscriber.handle.as_deref(),
    }
    .render()?)
}

pub fn render_updated(subscriber: &Subscriber) -> Result<String> {
    let interval = format_interval(subscriber.interval);
    Ok(UpdateTemplate {
        interval: &interval,
        handle: subscriber.handle.as_deref(),
    }
    .render()?)
}

pub fn render_unsubscribed() -> Result<String> {
    Ok(UnsubscribeTemplate.render()?)
}
