use std::collections::HashMap;

/// Attachment key carrying the cohort decision across hops.
pub const GROUP_ATTACHMENT: &str = "group";

/// Wildcard group literal some frameworks use for "any group". It must never
/// survive into a processed call's attachments; providers match the `group`
/// value against their own tag, and `*` matches nothing.
pub const WILDCARD_GROUP: &str = "*";

/// Per-call invocation state seen by the selector.
///
/// The attachment map is propagated to the provider and to every downstream
/// hop, which is what keeps a multi-hop call chain inside one cohort.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallContext {
    interface: String,
    consumer_application: String,
    attachments: HashMap<String, String>,
}

impl CallContext {
    pub fn new<I, C>(interface: I, consumer_application: C) -> Self
    where
        I: Into<String>,
        C: Into<String>,
    {
        CallContext {
            interface: interface.into(),
            consumer_application: consumer_application.into(),
            attachments: HashMap::new(),
        }
    }

    /// Fully qualified name of the interface being called.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Application name of the calling service instance.
    pub fn consumer_application(&self) -> &str {
        &self.consumer_application
    }

    pub fn attachment(&self, key: &str) -> Option<&str> {
        self.attachments.get(key).map(String::as_str)
    }

    pub fn set_attachment<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.attachments.insert(key.into(), value.into());
    }

    pub fn attachments(&self) -> &HashMap<String, String> {
        &self.attachments
    }

    /// The `group` attachment, if any hop has written it yet.
    pub fn group(&self) -> Option<&str> {
        self.attachment(GROUP_ATTACHMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachments() {
        let mut ctx = CallContext::new("com.example.CaseService", "web-gateway");
        assert_eq!(ctx.interface(), "com.example.CaseService");
        assert_eq!(ctx.consumer_application(), "web-gateway");
        assert!(ctx.group().is_none());

        ctx.set_attachment(GROUP_ATTACHMENT, "canary-a");
        assert_eq!(ctx.group(), Some("canary-a"));

        // overwrite, never accumulate
        ctx.set_attachment(GROUP_ATTACHMENT, "");
        assert_eq!(ctx.group(), Some(""));
        assert_eq!(ctx.attachments().len(), 1);
    }
}
