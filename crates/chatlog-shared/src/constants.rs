/// Application name
pub const APP_NAME: &str = "chatlog";

/// Conversation ids ending with this suffix belong to multi-party chatrooms
pub const CHATROOM_SUFFIX: &str = "@chatroom";

/// Prefix every local account id carries in the storage layout
pub const ACCOUNT_ID_PREFIX: &str = "wxid_";

/// Extension field carrying the real author of a chatroom message
pub const FIELD_SENDER_ID: i32 = 1;

/// Extension field carrying the thumbnail path hint
pub const FIELD_THUMB_PATH: i32 = 3;

/// Extension field carrying the primary attachment path hint
pub const FIELD_ATTACHMENT_PATH: i32 = 4;

/// Storage root subtrees
pub const MSG_DIR: &str = "Msg";
pub const MULTI_DIR: &str = "Multi";
pub const CONTACT_DB_FILE: &str = "MicroMsg.db";
pub const FILE_STORAGE_DIR: &str = "FileStorage";
pub const MSG_ATTACH_DIR: &str = "MsgAttach";
pub const CACHE_DIR: &str = "Cache";
pub const VOICE_DIR: &str = "Voice";
pub const FILE_DIR: &str = "File";
pub const IMAGE_DIR: &str = "Image";

/// Parent directory names tried, in order, when a hinted path is missing
pub const DIRECTORY_VARIANTS: [&str; 6] = ["Thumb", "Image", "Video", "File", "Voice", "Cache"];

/// Extension of the encrypted image container
pub const ENCRYPTED_IMAGE_EXT: &str = "dat";

/// Extension of stored voice clips
pub const VOICE_EXT: &str = "mp3";

/// Timestamp layout used in transcripts
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
