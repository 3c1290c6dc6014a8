//! Typed attribute sets handed to the templates, one shape per variant.
use serde::Serialize;

use crate::reconcile::ConstructorDescriptor;
use crate::variant::Variant;

/// Something a [`crate::templates::Renderer`] can render.
pub trait RenderableAttributes: Serialize {
    fn variant(&self) -> Variant;

    fn template_name(&self) -> &'static str {
        self.variant().name()
    }
}

/// Attributes shared by every variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonAttributes {
    pub package_name: String,
    /// Name of the generated class.
    pub class_name: String,
    /// The tagged declaration that extends the generated class.
    pub subclass_name: String,
    pub event_name: String,
    pub constructors: Vec<ConstructorDescriptor>,
    pub super_class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventAttributes {
    #[serde(flatten)]
    pub common: CommonAttributes,
}

/// Request and response share one shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAttributes {
    #[serde(skip)]
    pub variant: Variant,
    #[serde(flatten)]
    pub common: CommonAttributes,
    pub superclass_constructors: Vec<ConstructorDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TemplateAttributes {
    Event(EventAttributes),
    Message(MessageAttributes),
}

impl RenderableAttributes for EventAttributes {
    fn variant(&self) -> Variant { Variant::Event }
}

impl RenderableAttributes for MessageAttributes {
    fn variant(&self) -> Variant { self.variant }
}

impl RenderableAttributes for TemplateAttributes {
    fn variant(&self) -> Variant {
        match self {
            TemplateAttributes::Event(a) => a.variant(),
            TemplateAttributes::Message(a) => a.variant(),
        }
    }
}

impl TemplateAttributes {
    pub fn common(&self) -> &CommonAttributes {
        match self {
            TemplateAttributes::Event(a) => &a.common,
            TemplateAttributes::Message(a) => &a.common,
        }
    }

    pub fn partner_class(&self) -> Option<&str> {
        match self {
            TemplateAttributes::Event(_) => None,
            TemplateAttributes::Message(a) => a.partner_class.as_deref(),
        }
    }

    pub fn superclass_constructors(&self) -> &[ConstructorDescriptor] {
        match self {
            TemplateAttributes::Event(_) => &[],
            TemplateAttributes::Message(a) => &a.superclass_constructors,
        }
    }
}

/// Simple name with exactly one trailing `Event` removed.
pub fn event_name(simple_name: &str) -> &str {
    simple_name.strip_suffix("Event").unwrap_or(simple_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn common() -> CommonAttributes {
        CommonAttributes {
            package_name: "app".into(),
            class_name: "Bar".into(),
            subclass_name: "FooRequest".into(),
            event_name: "FooRequest".into(),
            constructors: vec![],
            super_class: "AbstractRequest".into(),
        }
    }

    #[test]
    fn event_names() {
        assert_eq!(event_name("FooEvent"), "Foo");
        assert_eq!(event_name("Foo"), "Foo");
        assert_eq!(event_name("Event"), "");
        assert_eq!(event_name("EventFoo"), "EventFoo");
        for name in ["FooEvent", "Foo", "Event", "Eventful", "XEvents"] {
            assert_eq!(event_name(event_name(name)), event_name(name));
        }
    }

    #[test]
    fn message_serializes_flat_camel_case() {
        let attrs = TemplateAttributes::Message(MessageAttributes {
            variant: Variant::Request,
            common: common(),
            superclass_constructors: vec![],
            partner_class: Some("FooResponse".into()),
        });
        assert_eq!(attrs.template_name(), "request");
        assert_eq!(serde_json::to_value(&attrs).unwrap(), json!({
            "packageName": "app",
            "className": "Bar",
            "subclassName": "FooRequest",
            "eventName": "FooRequest",
            "constructors": [],
            "superClass": "AbstractRequest",
            "superclassConstructors": [],
            "partnerClass": "FooResponse",
        }));
    }

    #[test]
    fn absent_partner_is_omitted() {
        let attrs = MessageAttributes {
            variant: Variant::Response,
            common: common(),
            superclass_constructors: vec![],
            partner_class: None,
        };
        let v = serde_json::to_value(&attrs).unwrap();
        assert!(v.get("partnerClass").is_none());
        assert_eq!(attrs.template_name(), "response");
    }

    #[test]
    fn event_has_no_message_fields() {
        let attrs = TemplateAttributes::Event(EventAttributes { common: common() });
        let v = serde_json::to_value(&attrs).unwrap();
        assert!(v.get("superclassConstructors").is_none());
        assert_eq!(v["superClass"], "AbstractRequest");
        assert_eq!(attrs.template_name(), "event");
    }
}
