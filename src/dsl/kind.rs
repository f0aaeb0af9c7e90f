//! Known Appsmith widget type tags and the friendly aliases accepted in specs.

use std::fmt;
use std::str::FromStr;

/// Widget types the editor knows how to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Canvas,
    Container,
    Text,
    Input,
    Button,
    IconButton,
    Table,
    TableV2,
    FilePicker,
    Select,
    MultiSelect,
    Checkbox,
    Switch,
    RadioGroup,
    DatePicker,
    Image,
    RichTextEditor,
    Divider,
    Modal,
    Form,
    JsonForm,
    List,
    Tabs,
    Iframe,
    Chart,
    Statbox,
    Progress,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 27] = [
        WidgetKind::Canvas,
        WidgetKind::Container,
        WidgetKind::Text,
        WidgetKind::Input,
        WidgetKind::Button,
        WidgetKind::IconButton,
        WidgetKind::Table,
        WidgetKind::TableV2,
        WidgetKind::FilePicker,
        WidgetKind::Select,
        WidgetKind::MultiSelect,
        WidgetKind::Checkbox,
        WidgetKind::Switch,
        WidgetKind::RadioGroup,
        WidgetKind::DatePicker,
        WidgetKind::Image,
        WidgetKind::RichTextEditor,
        WidgetKind::Divider,
        WidgetKind::Modal,
        WidgetKind::Form,
        WidgetKind::JsonForm,
        WidgetKind::List,
        WidgetKind::Tabs,
        WidgetKind::Iframe,
        WidgetKind::Chart,
        WidgetKind::Statbox,
        WidgetKind::Progress,
    ];

    /// The tag stored in the DSL `type` field.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Canvas => "CANVAS_WIDGET",
            Self::Container => "CONTAINER_WIDGET",
            Self::Text => "TEXT_WIDGET",
            Self::Input => "INPUT_WIDGET_V2",
            Self::Button => "BUTTON_WIDGET",
            Self::IconButton => "ICON_BUTTON_WIDGET",
            Self::Table => "TABLE_WIDGET",
            Self::TableV2 => "TABLE_WIDGET_V2",
            Self::FilePicker => "FILE_PICKER_WIDGET_V2",
            Self::Select => "SELECT_WIDGET",
            Self::MultiSelect => "MULTI_SELECT_WIDGET_V2",
            Self::Checkbox => "CHECKBOX_WIDGET",
            Self::Switch => "SWITCH_WIDGET",
            Self::RadioGroup => "RADIO_GROUP_WIDGET",
            Self::DatePicker => "DATE_PICKER_WIDGET2",
            Self::Image => "IMAGE_WIDGET",
            Self::RichTextEditor => "RICH_TEXT_EDITOR_WIDGET",
            Self::Divider => "DIVIDER_WIDGET",
            Self::Modal => "MODAL_WIDGET",
            Self::Form => "FORM_WIDGET",
            Self::JsonForm => "JSON_FORM_WIDGET",
            Self::List => "LIST_WIDGET_V2",
            Self::Tabs => "TABS_WIDGET",
            Self::Iframe => "IFRAME_WIDGET",
            Self::Chart => "CHART_WIDGET",
            Self::Statbox => "STATBOX_WIDGET",
            Self::Progress => "PROGRESS_WIDGET",
        }
    }

    fn alias(s: &str) -> Option<Self> {
        match s {
            "Text" => Some(Self::Text),
            "Input" => Some(Self::Input),
            "Button" => Some(Self::Button),
            "Table" => Some(Self::Table),
            "FilePicker" => Some(Self::FilePicker),
            _ => None,
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for WidgetKind {
    type Err = String;

    /// Accepts a friendly alias (`Button`) or a tag in any case (`button_widget`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(kind) = Self::alias(s) {
            return Ok(kind);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown widget type '{s}'"))
    }
}
