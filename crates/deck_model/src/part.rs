//! Parts: typed units of content inside a package
//!
//! A part is either XML-bodied (slides, masters, themes, ...) or binary
//! (media, embedded objects, fonts). Parts are identified by arena index
//! and referenced only through relationships.

use crate::error::{ModelError, ModelResult};
use crate::part_id::PartId;
use crate::xml::XmlElement;
use serde::{Deserialize, Serialize};

/// The closed set of part kinds the model understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartKind {
    /// The root presentation part (`ppt/presentation.xml`)
    Presentation,
    Slide,
    SlideMaster,
    SlideLayout,
    Theme,
    NotesSlide,
    NotesMaster,
    HandoutMaster,
    Comments,
    CommentAuthors,
    TableStyles,
    PresProps,
    ViewProps,
    /// Binary media payload (image, audio, video)
    Media,
    /// Binary embedded OLE object
    EmbeddedObject,
    /// Embedded package (e.g. a spreadsheet backing a chart)
    EmbeddedPackage,
    Chart,
    ChartDrawing,
    DiagramData,
    DiagramLayout,
    DiagramStyle,
    DiagramColors,
    CustomXml,
    Font,
    VmlDrawing,
    Control,
    LegacyText,
    Ink,
}

impl PartKind {
    /// Content type string written to `[Content_Types].xml` for this kind.
    ///
    /// Media and embedded-package parts carry payload-specific content
    /// types and return `None` here; their type is recorded per part.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            PartKind::Presentation => Some(
                "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml",
            ),
            PartKind::Slide => Some(
                "application/vnd.openxmlformats-officedocument.presentationml.slide+xml",
            ),
            PartKind::SlideMaster => Some(
                "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml",
            ),
            PartKind::SlideLayout => Some(
                "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml",
            ),
            PartKind::Theme => {
                Some("application/vnd.openxmlformats-officedocument.theme+xml")
            }
            PartKind::NotesSlide => Some(
                "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml",
            ),
            PartKind::NotesMaster => Some(
                "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml",
            ),
            PartKind::HandoutMaster => Some(
                "application/vnd.openxmlformats-officedocument.presentationml.handoutMaster+xml",
            ),
            PartKind::Comments => Some(
                "application/vnd.openxmlformats-officedocument.presentationml.comments+xml",
            ),
            PartKind::CommentAuthors => Some(
                "application/vnd.openxmlformats-officedocument.presentationml.commentAuthors+xml",
            ),
            PartKind::TableStyles => Some(
                "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml",
            ),
            PartKind::PresProps => Some(
                "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml",
            ),
            PartKind::ViewProps => Some(
                "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml",
            ),
            PartKind::Chart => Some(
                "application/vnd.openxmlformats-officedocument.drawingml.chart+xml",
            ),
            PartKind::ChartDrawing => Some(
                "application/vnd.openxmlformats-officedocument.drawingml.chartshapes+xml",
            ),
            PartKind::DiagramData => Some(
                "application/vnd.openxmlformats-officedocument.drawingml.diagramData+xml",
            ),
            PartKind::DiagramLayout => Some(
                "application/vnd.openxmlformats-officedocument.drawingml.diagramLayout+xml",
            ),
            PartKind::DiagramStyle => Some(
                "application/vnd.openxmlformats-officedocument.drawingml.diagramStyle+xml",
            ),
            PartKind::DiagramColors => Some(
                "application/vnd.openxmlformats-officedocument.drawingml.diagramColors+xml",
            ),
            PartKind::CustomXml => Some("application/xml"),
            PartKind::Font => Some("application/x-fontdata"),
            PartKind::VmlDrawing => Some("application/vnd.openxmlformats-officedocument.vmlDrawing"),
            PartKind::Control => Some(
                "application/vnd.ms-office.activeX+xml",
            ),
            PartKind::LegacyText => Some("text/plain"),
            PartKind::Ink => Some("application/inkml+xml"),
            PartKind::Media | PartKind::EmbeddedObject | PartKind::EmbeddedPackage => None,
        }
    }

    /// Map a content type string back to a kind, if it names a known one
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        const ALL: &[PartKind] = &[
            PartKind::Presentation,
            PartKind::Slide,
            PartKind::SlideMaster,
            PartKind::SlideLayout,
            PartKind::Theme,
            PartKind::NotesSlide,
            PartKind::NotesMaster,
            PartKind::HandoutMaster,
            PartKind::Comments,
            PartKind::CommentAuthors,
            PartKind::TableStyles,
            PartKind::PresProps,
            PartKind::ViewProps,
            PartKind::Chart,
            PartKind::ChartDrawing,
            PartKind::DiagramData,
            PartKind::DiagramLayout,
            PartKind::DiagramStyle,
            PartKind::DiagramColors,
            PartKind::Font,
            PartKind::VmlDrawing,
            PartKind::Control,
            PartKind::Ink,
        ];
        ALL.iter()
            .copied()
            .find(|k| k.content_type() == Some(content_type))
    }

    /// Directory and base file name this kind is stored under in the package
    pub fn path_family(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            PartKind::Presentation => ("ppt", "presentation", "xml"),
            PartKind::Slide => ("ppt/slides", "slide", "xml"),
            PartKind::SlideMaster => ("ppt/slideMasters", "slideMaster", "xml"),
            PartKind::SlideLayout => ("ppt/slideLayouts", "slideLayout", "xml"),
            PartKind::Theme => ("ppt/theme", "theme", "xml"),
            PartKind::NotesSlide => ("ppt/notesSlides", "notesSlide", "xml"),
            PartKind::NotesMaster => ("ppt/notesMasters", "notesMaster", "xml"),
            PartKind::HandoutMaster => ("ppt/handoutMasters", "handoutMaster", "xml"),
            PartKind::Comments => ("ppt/comments", "comment", "xml"),
            PartKind::CommentAuthors => ("ppt", "commentAuthors", "xml"),
            PartKind::TableStyles => ("ppt", "tableStyles", "xml"),
            PartKind::PresProps => ("ppt", "presProps", "xml"),
            PartKind::ViewProps => ("ppt", "viewProps", "xml"),
            PartKind::Media => ("ppt/media", "image", "bin"),
            PartKind::EmbeddedObject => ("ppt/embeddings", "oleObject", "bin"),
            PartKind::EmbeddedPackage => ("ppt/embeddings", "package", "bin"),
            PartKind::Chart => ("ppt/charts", "chart", "xml"),
            PartKind::ChartDrawing => ("ppt/charts", "chartDrawing", "xml"),
            PartKind::DiagramData => ("ppt/diagrams", "data", "xml"),
            PartKind::DiagramLayout => ("ppt/diagrams", "layout", "xml"),
            PartKind::DiagramStyle => ("ppt/diagrams", "quickStyle", "xml"),
            PartKind::DiagramColors => ("ppt/diagrams", "colors", "xml"),
            PartKind::CustomXml => ("customXml", "item", "xml"),
            PartKind::Font => ("ppt/fonts", "font", "fntdata"),
            PartKind::VmlDrawing => ("ppt/drawings", "vmlDrawing", "vml"),
            PartKind::Control => ("ppt/activeX", "activeX", "xml"),
            PartKind::LegacyText => ("ppt/slides", "legacy", "txt"),
            PartKind::Ink => ("ppt/ink", "ink", "xml"),
        }
    }

    /// True for kinds whose body is an opaque byte payload
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            PartKind::Media
                | PartKind::EmbeddedObject
                | PartKind::EmbeddedPackage
                | PartKind::Font
                | PartKind::LegacyText
        )
    }

    /// Leaf kinds the graph copier clones without scanning for references
    pub fn is_simple_leaf(&self) -> bool {
        matches!(
            self,
            PartKind::Media
                | PartKind::EmbeddedObject
                | PartKind::EmbeddedPackage
                | PartKind::Font
                | PartKind::Control
                | PartKind::Ink
                | PartKind::LegacyText
                | PartKind::VmlDrawing
        )
    }

    /// Composite kinds whose own tree must be grafted recursively
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            PartKind::Chart
                | PartKind::ChartDrawing
                | PartKind::DiagramData
                | PartKind::DiagramLayout
                | PartKind::DiagramStyle
                | PartKind::DiagramColors
        )
    }
}

/// The body of a part: an XML tree or opaque bytes
#[derive(Debug, Clone)]
pub enum PartBody {
    Xml(XmlElement),
    Binary(Vec<u8>),
    /// Placeholder left behind while a tree is checked out for rewriting
    CheckedOut,
}

/// One typed unit of content inside a package
#[derive(Debug, Clone)]
pub struct Part {
    /// What this part is
    pub kind: PartKind,
    /// Package-relative path (e.g. `ppt/slides/slide1.xml`)
    pub path: String,
    /// Content type override for kinds without a fixed one (media)
    pub content_type: Option<String>,
    pub(crate) body: PartBody,
}

impl Part {
    /// Create an XML-bodied part
    pub fn xml(kind: PartKind, path: impl Into<String>, tree: XmlElement) -> Self {
        Self {
            kind,
            path: path.into(),
            content_type: None,
            body: PartBody::Xml(tree),
        }
    }

    /// Create a binary part with an explicit content type
    pub fn binary(
        kind: PartKind,
        path: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            content_type: Some(content_type.into()),
            body: PartBody::Binary(data),
        }
    }

    /// Effective content type: the per-part override or the kind's fixed one
    pub fn effective_content_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .or_else(|| self.kind.content_type())
    }

    /// Borrow the XML tree, failing on binary or checked-out bodies
    pub fn tree(&self, id: PartId) -> ModelResult<&XmlElement> {
        match &self.body {
            PartBody::Xml(tree) => Ok(tree),
            PartBody::Binary(_) => Err(ModelError::NotXml(id)),
            PartBody::CheckedOut => Err(ModelError::BodyCheckedOut(id)),
        }
    }

    /// Borrow the byte payload, failing on XML or checked-out bodies
    pub fn bytes(&self, id: PartId) -> ModelResult<&[u8]> {
        match &self.body {
            PartBody::Binary(data) => Ok(data),
            PartBody::Xml(_) => Err(ModelError::NotBinary(id)),
            PartBody::CheckedOut => Err(ModelError::BodyCheckedOut(id)),
        }
    }

    /// True when the body is currently an XML tree
    pub fn has_tree(&self) -> bool {
        matches!(self.body, PartBody::Xml(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_roundtrip() {
        for kind in [
            PartKind::Slide,
            PartKind::SlideMaster,
            PartKind::SlideLayout,
            PartKind::Theme,
            PartKind::NotesSlide,
            PartKind::Comments,
            PartKind::Chart,
        ] {
            let ct = kind.content_type().unwrap();
            assert_eq!(PartKind::from_content_type(ct), Some(kind));
        }
    }

    #[test]
    fn test_media_has_no_fixed_content_type() {
        assert!(PartKind::Media.content_type().is_none());
        let part = Part::binary(PartKind::Media, "ppt/media/image1.png", "image/png", vec![1]);
        assert_eq!(part.effective_content_type(), Some("image/png"));
    }

    #[test]
    fn test_kind_classification() {
        assert!(PartKind::Media.is_simple_leaf());
        assert!(PartKind::Chart.is_composite());
        assert!(!PartKind::Slide.is_binary());
        assert!(PartKind::EmbeddedPackage.is_binary());
        assert!(PartKind::EmbeddedPackage.is_simple_leaf());
    }
}
