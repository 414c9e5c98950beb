//! # Response Renderer
//!
//! Maps a handler's abstract [`Answer`] plus its [`TargetMessagePolicy`] onto
//! a transport-ready [`PlatformMessage`]. Deterministic, no business logic:
//! custom ids are encoded here and Discord limits enforced.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Edit the roller and post the result as a second message
//! - 1.1.0: Modal answers for in-place reconfiguration
//! - 1.0.0: Content, embed and component rendering

pub mod answer;
pub mod notice;

use thiserror::Error;

use crate::core::error::CustomIdError;
use crate::core::response::{
    truncate_for_embed, truncate_for_message, truncate_label, truncate_to, EMBED_TITLE_LIMIT,
    INPUT_VALUE_LIMIT, MAX_ROWS, MAX_ROW_COMPONENTS, MODAL_TITLE_LIMIT,
};
use crate::interaction::CustomId;

pub use answer::{format_answer, mark_values, roll_answer};
pub use notice::Notice;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetMessagePolicy {
    /// Edit the message the event originated from
    EditExisting,
    /// Post a fresh message in the channel
    CreateNew,
    /// Reply visible to the acting user only
    CreateEphemeral,
    /// Answer a component click with a modal dialog
    OpenModal,
    /// Edit the originating message and post [`Answer::follow_up`] as a
    /// fresh message
    EditAndCreate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub custom_id: CustomId,
    pub label: String,
    pub style: ButtonStyle,
}

impl Button {
    pub fn new(custom_id: CustomId, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self {
            custom_id,
            label: label.into(),
            style,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectMenu {
    pub custom_id: CustomId,
    pub placeholder: String,
    pub options: Vec<SelectOption>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Component {
    Button(Button),
    Select(SelectMenu),
}

pub type ComponentRow = Vec<Component>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmbedAnswer {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<(String, String)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModalInput {
    pub id: String,
    pub label: String,
    pub value: String,
    pub paragraph: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModalAnswer {
    pub custom_id: CustomId,
    pub title: String,
    pub inputs: Vec<ModalInput>,
}

/// What a handler wants to show, independent of the transport
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Answer {
    pub content: Option<String>,
    pub embed: Option<EmbedAnswer>,
    pub rows: Vec<ComponentRow>,
    pub modal: Option<ModalAnswer>,
    pub follow_up: Option<Box<Answer>>,
}

impl Answer {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn modal(modal: ModalAnswer) -> Self {
        Self {
            modal: Some(modal),
            ..Self::default()
        }
    }

    pub fn with_rows(mut self, rows: Vec<ComponentRow>) -> Self {
        self.rows = rows;
        self
    }

    /// Append buttons, wrapping into rows of at most `per_row`
    pub fn with_button_grid(mut self, buttons: Vec<Button>, per_row: usize) -> Self {
        let per_row = per_row.clamp(1, MAX_ROW_COMPONENTS);
        let mut buttons = buttons.into_iter().peekable();
        while buttons.peek().is_some() {
            let row: ComponentRow = buttons
                .by_ref()
                .take(per_row)
                .map(Component::Button)
                .collect();
            self.rows.push(row);
        }
        self
    }

    pub fn with_button_row(self, buttons: Vec<Button>) -> Self {
        self.with_button_grid(buttons, MAX_ROW_COMPONENTS)
    }

    pub fn with_follow_up(mut self, follow_up: Answer) -> Self {
        self.follow_up = Some(Box::new(follow_up));
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderedComponent {
    Button {
        custom_id: String,
        label: String,
        style: ButtonStyle,
    },
    Select {
        custom_id: String,
        placeholder: String,
        options: Vec<SelectOption>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedEmbed {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<(String, String)>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageBody {
    pub content: String,
    pub embed: Option<RenderedEmbed>,
    pub rows: Vec<Vec<RenderedComponent>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModalBody {
    pub custom_id: String,
    pub title: String,
    pub inputs: Vec<ModalInput>,
}

/// Transport-ready call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlatformMessage {
    Edit(MessageBody),
    Create(MessageBody),
    Ephemeral(MessageBody),
    Modal(ModalBody),
    EditAndCreate {
        edit: MessageBody,
        create: MessageBody,
    },
}

impl PlatformMessage {
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, Self::Ephemeral(_))
    }

    pub fn body(&self) -> Option<&MessageBody> {
        match self {
            Self::Edit(body) | Self::Create(body) | Self::Ephemeral(body) => Some(body),
            Self::EditAndCreate { edit, .. } => Some(edit),
            Self::Modal(_) => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error(transparent)]
    CustomId(#[from] CustomIdError),
    #[error("{0} component rows exceed the limit of {max}", max = MAX_ROWS)]
    TooManyRows(usize),
    #[error("row with {0} components exceeds the limit of {max}", max = MAX_ROW_COMPONENTS)]
    RowTooWide(usize),
    #[error("modal policy without a modal answer")]
    MissingModal,
    #[error("edit-and-create policy without a follow-up answer")]
    MissingFollowUp,
    #[error("answer has neither content nor embed")]
    Empty,
}

/// Render `answer` for the given policy
pub fn render(answer: &Answer, policy: TargetMessagePolicy) -> Result<PlatformMessage, RenderError> {
    Ok(match policy {
        TargetMessagePolicy::OpenModal => {
            let modal = answer.modal.as_ref().ok_or(RenderError::MissingModal)?;
            PlatformMessage::Modal(render_modal(modal)?)
        }
        TargetMessagePolicy::EditAndCreate => {
            let follow_up = answer.follow_up.as_ref().ok_or(RenderError::MissingFollowUp)?;
            PlatformMessage::EditAndCreate {
                edit: render_body(answer)?,
                create: render_body(follow_up)?,
            }
        }
        TargetMessagePolicy::EditExisting => PlatformMessage::Edit(render_body(answer)?),
        TargetMessagePolicy::CreateNew => PlatformMessage::Create(render_body(answer)?),
        TargetMessagePolicy::CreateEphemeral => PlatformMessage::Ephemeral(render_body(answer)?),
    })
}

fn render_body(answer: &Answer) -> Result<MessageBody, RenderError> {
    let content = answer.content.as_deref().map(truncate_for_message);
    if content.is_none() && answer.embed.is_none() {
        return Err(RenderError::Empty);
    }
    if answer.rows.len() > MAX_ROWS {
        return Err(RenderError::TooManyRows(answer.rows.len()));
    }

    let mut rows = Vec::with_capacity(answer.rows.len());
    for row in &answer.rows {
        if row.len() > MAX_ROW_COMPONENTS {
            return Err(RenderError::RowTooWide(row.len()));
        }
        let rendered = row
            .iter()
            .map(render_component)
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(rendered);
    }

    Ok(MessageBody {
        content: content.unwrap_or_default(),
        embed: answer.embed.as_ref().map(|embed| RenderedEmbed {
            title: truncate_to(&embed.title, EMBED_TITLE_LIMIT),
            description: embed.description.as_deref().map(truncate_for_embed),
            fields: embed.fields.clone(),
        }),
        rows,
    })
}

fn render_component(component: &Component) -> Result<RenderedComponent, RenderError> {
    Ok(match component {
        Component::Button(button) => RenderedComponent::Button {
            custom_id: button.custom_id.encode()?,
            label: truncate_label(&button.label),
            style: button.style,
        },
        Component::Select(menu) => RenderedComponent::Select {
            custom_id: menu.custom_id.encode()?,
            placeholder: truncate_label(&menu.placeholder),
            options: menu
                .options
                .iter()
                .map(|option| SelectOption {
                    value: option.value.clone(),
                    label: truncate_label(&option.label),
                    selected: option.selected,
                })
                .collect(),
        },
    })
}

fn render_modal(modal: &ModalAnswer) -> Result<ModalBody, RenderError> {
    Ok(ModalBody {
        custom_id: modal.custom_id.encode()?,
        title: truncate_to(&modal.title, MODAL_TITLE_LIMIT),
        inputs: modal
            .inputs
            .iter()
            .map(|input| ModalInput {
                id: input.id.clone(),
                label: truncate_to(&input.label, MODAL_TITLE_LIMIT),
                value: truncate_to(&input.value, INPUT_VALUE_LIMIT),
                paragraph: input.paragraph,
            })
            .collect(),
    })
}
