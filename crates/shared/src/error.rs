use thiserror::Error;

/// Bot message appended whenever a chat exchange fails, whatever the cause.
pub const CONNECTIVITY_FAILURE_TEXT: &str = "Error al conectar con el servidor.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("transport failure: {0}")]
    Network(String),
    #[error("server responded with status {status}")]
    BadStatus { status: u16 },
    #[error("malformed response body: {0}")]
    MalformedResponse(String),
}

impl ChatError {
    /// Text shown to the user for this failure. All variants collapse to the
    /// same connectivity message.
    pub fn user_message(&self) -> &'static str {
        CONNECTIVITY_FAILURE_TEXT
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("speech recognition is not supported on this platform")]
    Unsupported,
    #[error("no speech detected")]
    NoSpeech,
    #[error("no microphone detected")]
    NoMicrophone,
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("recognition error: {0}")]
    Other(String),
}

impl RecognitionError {
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "audio-capture" => Self::NoMicrophone,
            "not-allowed" => Self::PermissionDenied,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Unsupported => "Tu plataforma no soporta reconocimiento de voz.".to_string(),
            Self::NoSpeech => "No se detectó ninguna voz. Inténtalo de nuevo.".to_string(),
            Self::NoMicrophone => {
                "No se detectó micrófono. Asegúrate de tener uno conectado.".to_string()
            }
            Self::PermissionDenied => {
                "Permiso de micrófono denegado. Habilita el acceso al micrófono.".to_string()
            }
            Self::Other(code) => format!("Error de reconocimiento: {code}"),
        }
    }
}
