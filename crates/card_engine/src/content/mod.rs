mod card;

pub use card::{
    load_card_content, parse_card_content, CardContent, CertificateText, ContentErrorCode,
    ContentLoadError, SourceLocation, TutorialStep,
};
