//! Typed element classification
//!
//! Maps tag names onto the element classes the rest of the engine dispatches
//! on: form controls, table parts, sectioning and phrasing content.

/// Element classes recognized by the engine.
///
/// Unrecognized tags fall back to [`ElementKind::Unknown`], which behaves as
/// a generic inline container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Anchor,
    Body,
    Break,
    Button,
    Caption,
    DefinitionList,
    Division,
    Fieldset,
    Form,
    Head,
    Heading,
    Html,
    Image,
    Input,
    Label,
    Legend,
    ListItem,
    Meta,
    NoScript,
    OptionGroup,
    OptionItem,
    OrderedList,
    Paragraph,
    Preformatted,
    Script,
    Select,
    Span,
    Style,
    Table,
    TableBody,
    TableCell,
    TableFoot,
    TableHead,
    TableHeaderCell,
    TableRow,
    Template,
    TextArea,
    Title,
    UnorderedList,
    Unknown,
}

impl ElementKind {
    /// Classify a lowercase tag name
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "a" => Self::Anchor,
            "body" => Self::Body,
            "br" => Self::Break,
            "button" => Self::Button,
            "caption" => Self::Caption,
            "dl" => Self::DefinitionList,
            "div" => Self::Division,
            "fieldset" => Self::Fieldset,
            "form" => Self::Form,
            "head" => Self::Head,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Self::Heading,
            "html" => Self::Html,
            "img" => Self::Image,
            "input" => Self::Input,
            "label" => Self::Label,
            "legend" => Self::Legend,
            "li" => Self::ListItem,
            "meta" => Self::Meta,
            "noscript" => Self::NoScript,
            "optgroup" => Self::OptionGroup,
            "option" => Self::OptionItem,
            "ol" => Self::OrderedList,
            "p" => Self::Paragraph,
            "pre" => Self::Preformatted,
            "script" => Self::Script,
            "select" => Self::Select,
            "span" => Self::Span,
            "style" => Self::Style,
            "table" => Self::Table,
            "tbody" => Self::TableBody,
            "td" => Self::TableCell,
            "tfoot" => Self::TableFoot,
            "thead" => Self::TableHead,
            "th" => Self::TableHeaderCell,
            "tr" => Self::TableRow,
            "template" => Self::Template,
            "textarea" => Self::TextArea,
            "title" => Self::Title,
            "ul" => Self::UnorderedList,
            _ => Self::Unknown,
        }
    }

    /// Form controls that can contribute name/value pairs on submission
    pub fn is_submittable_control(self) -> bool {
        matches!(
            self,
            Self::Input | Self::Select | Self::TextArea | Self::Button
        )
    }

    /// Elements whose content never reaches the visible-text serializer
    pub fn is_non_rendered(self) -> bool {
        matches!(
            self,
            Self::Script | Self::Style | Self::NoScript | Self::Template | Self::Head | Self::Title | Self::Meta
        )
    }

    /// Table cell of either flavor (`td` / `th`)
    pub fn is_cell(self) -> bool {
        matches!(self, Self::TableCell | Self::TableHeaderCell)
    }
}

/// Void elements: never have children, serialized without a closing tag
pub fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}
