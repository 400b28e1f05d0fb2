use minijinja::{context, AutoEscape, Environment};

use crate::models::ChatEntry;

const CHAT_TEMPLATE: &str = "index.html";

/// Jinja template for the chat page, compiled once at startup.
#[derive(Debug, Clone)]
pub struct ChatPage {
    env: Environment<'static>,
}

impl ChatPage {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_template(CHAT_TEMPLATE, include_str!("../../static/index.html"))?;

        Ok(Self { env })
    }

    /// Render the page with past exchanges, oldest first.
    pub fn render(&self, entries: &[ChatEntry]) -> Result<String, minijinja::Error> {
        self.env
            .get_template(CHAT_TEMPLATE)?
            .render(context! { chat_history => entries })
    }
}
