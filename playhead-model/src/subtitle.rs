/// One hit from the remote subtitle catalogue
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoteSubtitleCandidate {
    pub id: String,
    pub name: String,
    pub language: String,
    pub format: Option<String>,
    pub provider: String,
    pub download_count: Option<u32>,
    pub community_rating: Option<f32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_hearing_impaired: bool,
}

impl RemoteSubtitleCandidate {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        language: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: language.into(),
            format: None,
            provider: provider.into(),
            download_count: None,
            community_rating: None,
            is_hearing_impaired: false,
        }
    }
}
