use std::{borrow::Cow, collections::HashMap};

/// One inbound message as handed over by the transport.
///
/// The chain never looks inside; only middlewares and handlers do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    pub routing_key: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub correlation_id: Option<String>,
    pub reply_to: Option<String>,
    pub redelivered: bool,
}

impl Delivery {
    pub fn new(routing_key: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            routing_key: routing_key.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_reply_to(mut self, routing_key: impl Into<String>) -> Self {
        self.reply_to = Some(routing_key.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|v| v.as_str())
    }

    pub fn body_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let delivery = Delivery::new("orders.created", "payload")
            .with_header("authorization", "secret")
            .with_correlation_id("c-1")
            .with_reply_to("orders.reply");

        assert_eq!(delivery.routing_key, "orders.created");
        assert_eq!(delivery.header("authorization"), Some("secret"));
        assert_eq!(delivery.header("missing"), None);
        assert_eq!(delivery.correlation_id.as_deref(), Some("c-1"));
        assert_eq!(delivery.reply_to.as_deref(), Some("orders.reply"));
        assert!(!delivery.redelivered);
    }

    #[test]
    fn test_body_str_is_lossy() {
        let delivery = Delivery::new("k", vec![b'o', b'k', 0xff]);
        assert_eq!(delivery.body_str(), "ok\u{fffd}");
    }
}
