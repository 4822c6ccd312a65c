use serde::{ Serialize, Deserialize };

use super::chat::Message;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    pub data: String,
    pub mime_type: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "chat")] Chat {
        #[serde(default)]
        content: String,
        #[serde(default)]
        image: Option<ImageUpload>,
    },
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "welcome")] Welcome {
        examples: Vec<String>,
    },
    #[serde(rename = "state")] State {
        messages: Vec<Message>,
        busy: bool,
        timestamp: i64,
    },
    #[serde(rename = "error")] Error {
        message: String,
    },
}
