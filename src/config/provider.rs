//! Provider selection from probed credentials.

use super::env::Credentials;

/// Backend family a check or enricher talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Azure-hosted OpenAI deployment (endpoint + key).
    AzureOpenAi,
    /// api.openai.com directly.
    OpenAi,
}

impl ProviderKind {
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::AzureOpenAi => "azure_openai",
            ProviderKind::OpenAi => "openai",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::AzureOpenAi => "Azure OpenAI",
            ProviderKind::OpenAi => "OpenAI",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A selected provider together with the credentials it needs.
#[derive(Clone, PartialEq, Eq)]
pub enum ProviderSelection {
    AzureOpenAi { endpoint: String, api_key: String },
    OpenAi { api_key: String },
}

impl ProviderSelection {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderSelection::AzureOpenAi { .. } => ProviderKind::AzureOpenAi,
            ProviderSelection::OpenAi { .. } => ProviderKind::OpenAi,
        }
    }

    pub fn api_key(&self) -> &str {
        match self {
            ProviderSelection::AzureOpenAi { api_key, .. }
            | ProviderSelection::OpenAi { api_key } => api_key,
        }
    }
}

impl std::fmt::Debug for ProviderSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderSelection::AzureOpenAi { endpoint, .. } => f
                .debug_struct("AzureOpenAi")
                .field("endpoint", endpoint)
                .field("api_key", &"***")
                .finish(),
            ProviderSelection::OpenAi { .. } => {
                f.debug_struct("OpenAi").field("api_key", &"***").finish()
            }
        }
    }
}

/// Pick a provider. The Azure pair wins over the OpenAI key; `None` if neither is usable.
pub fn select_provider(credentials: &Credentials) -> Option<ProviderSelection> {
    match credentials {
        Credentials {
            azure_endpoint: Some(endpoint),
            azure_api_key: Some(api_key),
            ..
        } => Some(ProviderSelection::AzureOpenAi {
            endpoint: endpoint.clone(),
            api_key: api_key.clone(),
        }),
        Credentials {
            openai_api_key: Some(api_key),
            ..
        } => Some(ProviderSelection::OpenAi {
            api_key: api_key.clone(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(endpoint: bool, azure_key: bool, openai_key: bool) -> Credentials {
        Credentials {
            azure_endpoint: endpoint.then(|| "https://res.openai.azure.com".to_string()),
            azure_api_key: azure_key.then(|| "azure-key".to_string()),
            openai_api_key: openai_key.then(|| "sk-openai".to_string()),
        }
    }

    #[test]
    fn test_decision_table_covers_every_combination() {
        for bits in 0u8..8 {
            let (e, a, o) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
            let expected = if e && a {
                Some(ProviderKind::AzureOpenAi)
            } else if o {
                Some(ProviderKind::OpenAi)
            } else {
                None
            };
            let selected = select_provider(&creds(e, a, o)).map(|s| s.kind());
            assert_eq!(selected, expected, "endpoint={e} azure_key={a} openai_key={o}");
        }
    }

    #[test]
    fn test_azure_selection_carries_credentials() {
        let selection = select_provider(&creds(true, true, true)).unwrap();
        assert_eq!(
            selection,
            ProviderSelection::AzureOpenAi {
                endpoint: "https://res.openai.azure.com".into(),
                api_key: "azure-key".into(),
            }
        );
        assert_eq!(selection.api_key(), "azure-key");
    }

    #[test]
    fn test_partial_azure_falls_back_to_openai() {
        let selection = select_provider(&creds(true, false, true)).unwrap();
        assert_eq!(selection.kind(), ProviderKind::OpenAi);
        assert_eq!(selection.api_key(), "sk-openai");
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!("{:?}", select_provider(&creds(false, false, true)).unwrap());
        assert!(!rendered.contains("sk-openai"));
    }
}
