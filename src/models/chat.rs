use base64::{ engine::general_purpose::STANDARD, Engine as _ };
use serde::{ Deserialize, Serialize };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Base64 payload plus its MIME type, as exchanged with the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub data: String,
    pub mime_type: String,
}

impl InlineData {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self { data: data.into(), mime_type: mime_type.into() }
    }

    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self::new(STANDARD.encode(bytes), mime_type)
    }

    /// Empty payloads or MIME types never make it into a message.
    pub fn is_usable(&self) -> bool {
        !self.data.is_empty() && !self.mime_type.trim().is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    InlineData(InlineData),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            Part::InlineData(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    /// Display order: text first, then the attached image.
    pub fn from_user(text: Option<&str>, image: Option<&InlineData>) -> Option<Self> {
        let mut parts = Vec::with_capacity(2);
        if let Some(text) = text.filter(|t| !t.is_empty()) {
            parts.push(Part::text(text));
        }
        if let Some(image) = image.filter(|i| i.is_usable()) {
            parts.push(Part::InlineData(image.clone()));
        }
        if parts.is_empty() {
            return None;
        }
        Some(Self::new(Role::User, parts))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub busy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_uses_provider_field_names() {
        let text = serde_json::to_value(Part::text("hi")).unwrap();
        assert_eq!(text, serde_json::json!({ "text": "hi" }));

        let image = serde_json::to_value(Part::InlineData(InlineData::new("AAAA", "image/png"))).unwrap();
        assert_eq!(
            image,
            serde_json::json!({ "inlineData": { "data": "AAAA", "mimeType": "image/png" } })
        );
    }

    #[test]
    fn user_message_puts_text_before_image() {
        let image = InlineData::new("AAAA", "image/png");
        let msg = Message::from_user(Some("what is this?"), Some(&image)).unwrap();
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.parts, vec![Part::text("what is this?"), Part::InlineData(image)]);
    }

    #[test]
    fn user_message_skips_empty_pieces() {
        assert!(Message::from_user(Some(""), None).is_none());
        assert!(Message::from_user(None, Some(&InlineData::new("", "image/png"))).is_none());
        assert!(Message::from_user(None, Some(&InlineData::new("AAAA", " "))).is_none());

        let msg = Message::from_user(Some("hello"), Some(&InlineData::new("", ""))).unwrap();
        assert_eq!(msg.parts, vec![Part::text("hello")]);
    }

    #[test]
    fn from_bytes_encodes_standard_base64() {
        let data = InlineData::from_bytes(b"png", "image/png");
        assert_eq!(data.data, "cG5n");
        assert!(data.is_usable());
    }
}
