//! Turn data model and webhook form decoding.

/// One attachment as reported by the provider, in provider index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub url: String,
    pub content_type: String,
}

/// Everything captured from one webhook call. Plain data only — the
/// background task must outlive the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundTurn {
    /// Sender address (`From`), reply destination.
    pub sender: String,
    /// Recipient address (`To`), used as the reply's "from" identity.
    pub recipient: String,
    /// Text body, trimmed; may be empty.
    pub text: String,
    /// Attachments in provider index order.
    pub media: Vec<MediaRef>,
}

impl InboundTurn {
    /// Build a turn from decoded form pairs.
    ///
    /// Returns `None` when `From` is absent or blank — the one request-shape
    /// error the webhook surfaces synchronously as a 400.
    #[must_use]
    pub fn from_params(params: &[(String, String)]) -> Option<Self> {
        let get = |name: &str| {
            params
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.trim().to_string())
        };

        let sender = get("From").filter(|s| !s.is_empty())?;
        let recipient = get("To").unwrap_or_default();
        let text = get("Body").unwrap_or_default();

        let num_media: usize = get("NumMedia")
            .and_then(|n| n.parse().ok())
            .unwrap_or_default();
        let media = (0..num_media)
            .filter_map(|i| {
                let url = get(&format!("MediaUrl{i}")).filter(|u| !u.is_empty())?;
                let content_type = get(&format!("MediaContentType{i}")).unwrap_or_default();
                Some(MediaRef { url, content_type })
            })
            .collect();

        Some(Self {
            sender,
            recipient,
            text,
            media,
        })
    }
}

/// A self-contained image representation the agent runtime can view without
/// provider credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub embeddable_uri: String,
}

/// Output of media normalization: one combined text signal plus ordered
/// inline images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTurn {
    pub text: String,
    pub images: Vec<ImageReference>,
}

impl NormalizedTurn {
    /// Image URIs in order, for the agent content blocks.
    #[must_use]
    pub fn image_uris(&self) -> Vec<String> {
        self.images
            .iter()
            .map(|image| image.embeddable_uri.clone())
            .collect()
    }
}
