//! Whisper model metadata catalog.
//!
//! Multilingual ggml releases only — this tool forces Chinese, so the
//! English-only `.en` variants are deliberately absent.

/// Metadata for a Whisper model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Model identifier (e.g. "large-v3")
    pub name: &'static str,
    /// Model size in megabytes
    pub size_mb: u32,
    /// Download URL from HuggingFace
    pub url: &'static str,
}

/// Catalog of available Whisper models, smallest to largest.
///
/// `large-v3` is the accuracy reference for Mandarin; the quantized
/// `large-v3-q5_0` trades a little accuracy for a third of the memory, and
/// `large-v3-turbo` for most of the inference time.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "tiny",
        size_mb: 75,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny.bin",
    },
    ModelInfo {
        name: "base",
        size_mb: 142,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.bin",
    },
    ModelInfo {
        name: "small",
        size_mb: 466,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-small.bin",
    },
    ModelInfo {
        name: "medium",
        size_mb: 1533,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-medium.bin",
    },
    ModelInfo {
        name: "large-v2",
        size_mb: 3094,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v2.bin",
    },
    ModelInfo {
        name: "large-v3",
        size_mb: 3095,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3.bin",
    },
    ModelInfo {
        name: "large-v3-q5_0",
        size_mb: 1081,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3-q5_0.bin",
    },
    ModelInfo {
        name: "large-v3-turbo",
        size_mb: 1624,
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3-turbo.bin",
    },
];

/// Find a model by name.
pub fn get_model(name: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.name == name)
}

/// Get all available models.
pub fn list_models() -> &'static [ModelInfo] {
    MODELS
}

/// Resolve convenience aliases to catalog names.
///
/// `large` means the latest large release; `turbo` its distilled variant.
/// Unknown names pass through unchanged.
pub fn resolve_name(name: &str) -> &str {
    match name {
        "large" => "large-v3",
        "turbo" => "large-v3-turbo",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_model_finds_catalog_entries() {
        let model = get_model("large-v3").unwrap();
        assert_eq!(model.size_mb, 3095);
        assert!(model.url.ends_with("ggml-large-v3.bin"));

        assert!(get_model("nonexistent").is_none());
    }

    #[test]
    fn catalog_has_no_english_only_models() {
        assert!(list_models().iter().all(|m| !m.name.ends_with(".en")));
    }

    #[test]
    fn resolve_name_maps_aliases() {
        assert_eq!(resolve_name("large"), "large-v3");
        assert_eq!(resolve_name("turbo"), "large-v3-turbo");
        assert_eq!(resolve_name("medium"), "medium");
        assert_eq!(resolve_name("unknown"), "unknown");
    }

    #[test]
    fn resolved_aliases_exist_in_catalog() {
        for alias in ["large", "turbo"] {
            assert!(get_model(resolve_name(alias)).is_some());
        }
    }
}
