use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownField,
    DuplicateField,
    MissingField,
    EmptyTutorial,
}

#[derive(Debug, Clone)]
pub struct ContentLoadError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentLoadError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorialStep {
    pub title: String,
    pub body: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateText {
    pub title: String,
    pub lines: Vec<String>,
}

/// Every piece of text the card shows, from the envelope to the certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardContent {
    pub recipient: String,
    pub greeting: String,
    pub message: String,
    pub ticket: String,
    pub certificate: CertificateText,
    pub tutorial: Vec<TutorialStep>,
}

impl Default for CardContent {
    fn default() -> Self {
        Self {
            recipient: "Friend".to_string(),
            greeting: "Happy Birthday!".to_string(),
            message: "Hope your day is filled with love and laughter! May all of your \
                      birthday wishes come true."
                .to_string(),
            ticket: "Birthday Pass - Admit One".to_string(),
            certificate: CertificateText {
                title: "Birthday Surprise".to_string(),
                lines: vec![
                    "This ticket grants one unforgettable birthday experience".to_string(),
                    "Valid for: one incredible celebration".to_string(),
                    "Date: today and forever".to_string(),
                ],
            },
            tutorial: vec![
                step(
                    "Welcome to your birthday surprise!",
                    "This is an interactive birthday experience designed just for you.",
                    "Get Started",
                ),
                step(
                    "Step 1: Open the envelope",
                    "Hover over the red wax seal, or tap it, to break the seal.",
                    "Next",
                ),
                step(
                    "Step 2: Pull out the card",
                    "Drag the card peeking out of the envelope downward to pull it out.",
                    "Next",
                ),
                step(
                    "Step 3: Explore the card",
                    "Click the card to open it and look for the golden ticket inside.",
                    "Next",
                ),
                step(
                    "Step 4: Claim your surprise",
                    "Click the golden ticket, then download your surprise to keep forever.",
                    "Start Experience",
                ),
            ],
        }
    }
}

fn step(title: &str, body: &str, action: &str) -> TutorialStep {
    TutorialStep {
        title: title.to_string(),
        body: body.to_string(),
        action: action.to_string(),
    }
}

pub fn load_card_content(path: &Path) -> Result<CardContent, ContentLoadError> {
    let raw = fs::read_to_string(path).map_err(|error| ContentLoadError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read card content: {error}"),
        file_path: path.to_path_buf(),
        location: None,
    })?;
    parse_card_content(path, &raw)
}

pub fn parse_card_content(file_path: &Path, raw: &str) -> Result<CardContent, ContentLoadError> {
    let doc = Document::parse(raw).map_err(|error| ContentLoadError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;

    let ctx = ParseContext {
        file_path,
        doc: &doc,
    };
    let root = doc.root_element();
    if root.tag_name().name() != "Card" {
        return Err(ctx.error_at(
            ContentErrorCode::InvalidRoot,
            format!("root element must be <Card>, found <{}>", root.tag_name().name()),
            root,
        ));
    }

    let mut seen = HashSet::<&str>::new();
    let mut recipient = None;
    let mut greeting = None;
    let mut message = None;
    let mut ticket = None;
    let mut certificate = None;
    let mut tutorial = None;

    for field in root.children().filter(Node::is_element) {
        let name = field.tag_name().name();
        if !seen.insert(name) {
            return Err(ctx.error_at(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{name}> in <Card>"),
                field,
            ));
        }
        match name {
            "recipient" => recipient = Some(ctx.text_of(field)?),
            "greeting" => greeting = Some(ctx.text_of(field)?),
            "message" => message = Some(ctx.text_of(field)?),
            "ticket" => ticket = Some(ctx.text_of(field)?),
            "certificate" => certificate = Some(ctx.parse_certificate(field)?),
            "tutorial" => tutorial = Some(ctx.parse_tutorial(field)?),
            other => {
                return Err(ctx.error_at(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{other}> in <Card>"),
                    field,
                ))
            }
        }
    }

    Ok(CardContent {
        recipient: ctx.required(recipient, "recipient", root)?,
        greeting: ctx.required(greeting, "greeting", root)?,
        message: ctx.required(message, "message", root)?,
        ticket: ctx.required(ticket, "ticket", root)?,
        certificate: ctx.required(certificate, "certificate", root)?,
        // A card without a tutorial skips straight to the envelope.
        tutorial: tutorial.unwrap_or_default(),
    })
}

struct ParseContext<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl ParseContext<'_, '_> {
    fn parse_certificate(&self, node: Node<'_, '_>) -> Result<CertificateText, ContentLoadError> {
        let mut title = None;
        let mut lines = Vec::new();
        for field in node.children().filter(Node::is_element) {
            match field.tag_name().name() {
                "title" if title.is_some() => {
                    return Err(self.error_at(
                        ContentErrorCode::DuplicateField,
                        "duplicate field <title> in <certificate>".to_string(),
                        field,
                    ))
                }
                "title" => title = Some(self.text_of(field)?),
                "line" => lines.push(self.text_of(field)?),
                other => {
                    return Err(self.error_at(
                        ContentErrorCode::UnknownField,
                        format!("unknown field <{other}> in <certificate>"),
                        field,
                    ))
                }
            }
        }
        Ok(CertificateText {
            title: self.required(title, "title", node)?,
            lines,
        })
    }

    fn parse_tutorial(&self, node: Node<'_, '_>) -> Result<Vec<TutorialStep>, ContentLoadError> {
        let mut steps = Vec::new();
        for field in node.children().filter(Node::is_element) {
            if field.tag_name().name() != "step" {
                return Err(self.error_at(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{}> in <tutorial>", field.tag_name().name()),
                    field,
                ));
            }
            steps.push(self.parse_step(field)?);
        }
        if steps.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::EmptyTutorial,
                "<tutorial> must contain at least one <step>".to_string(),
                node,
            ));
        }
        Ok(steps)
    }

    fn parse_step(&self, node: Node<'_, '_>) -> Result<TutorialStep, ContentLoadError> {
        let mut seen = HashSet::<&str>::new();
        let mut title = None;
        let mut body = None;
        let mut action = None;
        for field in node.children().filter(Node::is_element) {
            let name = field.tag_name().name();
            if !seen.insert(name) {
                return Err(self.error_at(
                    ContentErrorCode::DuplicateField,
                    format!("duplicate field <{name}> in <step>"),
                    field,
                ));
            }
            match name {
                "title" => title = Some(self.text_of(field)?),
                "body" => body = Some(self.text_of(field)?),
                "action" => action = Some(self.text_of(field)?),
                other => {
                    return Err(self.error_at(
                        ContentErrorCode::UnknownField,
                        format!("unknown field <{other}> in <step>"),
                        field,
                    ))
                }
            }
        }
        Ok(TutorialStep {
            title: self.required(title, "title", node)?,
            body: self.required(body, "body", node)?,
            action: action.unwrap_or_else(|| "Next".to_string()),
        })
    }

    /// Trimmed text with inner whitespace runs collapsed; empty text counts as missing.
    fn text_of(&self, node: Node<'_, '_>) -> Result<String, ContentLoadError> {
        let text = node
            .text()
            .unwrap_or_default()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::MissingField,
                format!("<{}> must not be empty", node.tag_name().name()),
                node,
            ));
        }
        Ok(text)
    }

    fn required<T>(
        &self,
        value: Option<T>,
        field: &str,
        parent: Node<'_, '_>,
    ) -> Result<T, ContentLoadError> {
        value.ok_or_else(|| {
            self.error_at(
                ContentErrorCode::MissingField,
                format!(
                    "missing required field <{field}> in <{}>",
                    parent.tag_name().name()
                ),
                parent,
            )
        })
    }

    fn error_at(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentLoadError {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentLoadError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }
}
