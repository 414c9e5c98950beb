//! Deliver rendered [`PlatformMessage`]s as interaction responses
//!
//! Also completes the two-step roller creation: post the message, learn its
//! id, store the config, and roll the message back if storing fails.
//! Edit-and-create answers update the roller first and then post the result
//! as a follow-up.

use anyhow::Result;
use log::{error, warn};
use serenity::builder::{
    CreateComponents, CreateEmbed, CreateInteractionResponse, CreateInteractionResponseData,
    CreateInteractionResponseFollowup,
};
use serenity::model::application::component::{ButtonStyle as DiscordButtonStyle, InputTextStyle};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::modal::ModalSubmitInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::channel::Message;
use serenity::prelude::Context;

use crate::commands::{InteractionEngine, Outcome};
use crate::render::{
    ButtonStyle, MessageBody, ModalBody, Notice, PlatformMessage, RenderedComponent,
    RenderedEmbed,
};

/// The interaction a response goes to
#[derive(Clone, Copy)]
pub enum Incoming<'a> {
    Command(&'a ApplicationCommandInteraction),
    Component(&'a MessageComponentInteraction),
    Modal(&'a ModalSubmitInteraction),
}

impl Incoming<'_> {
    fn locale(&self) -> &str {
        match self {
            Self::Command(i) => &i.locale,
            Self::Component(i) => &i.locale,
            Self::Modal(i) => &i.locale,
        }
    }

    /// Slash commands have no message of their own to update
    fn can_update(&self) -> bool {
        !matches!(self, Self::Command(_))
    }

    async fn respond(&self, ctx: &Context, message: &PlatformMessage) -> Result<()> {
        let can_update = self.can_update();
        match self {
            Self::Command(i) => {
                i.create_interaction_response(&ctx.http, |r| fill(r, message, can_update))
                    .await?
            }
            Self::Component(i) => {
                i.create_interaction_response(&ctx.http, |r| fill(r, message, can_update))
                    .await?
            }
            Self::Modal(i) => {
                i.create_interaction_response(&ctx.http, |r| fill(r, message, can_update))
                    .await?
            }
        }
        Ok(())
    }

    async fn posted_message(&self, ctx: &Context) -> Result<Message> {
        Ok(match self {
            Self::Command(i) => i.get_interaction_response(&ctx.http).await?,
            Self::Component(i) => i.get_interaction_response(&ctx.http).await?,
            Self::Modal(i) => i.get_interaction_response(&ctx.http).await?,
        })
    }

    async fn delete_response(&self, ctx: &Context) -> Result<()> {
        match self {
            Self::Command(i) => i.delete_original_interaction_response(&ctx.http).await?,
            Self::Component(i) => i.delete_original_interaction_response(&ctx.http).await?,
            Self::Modal(i) => i.delete_original_interaction_response(&ctx.http).await?,
        }
        Ok(())
    }

    async fn follow_up(&self, ctx: &Context, text: &str) -> Result<()> {
        match self {
            Self::Command(i) => {
                i.create_followup_message(&ctx.http, |f| f.content(text).ephemeral(true))
                    .await?;
            }
            Self::Component(i) => {
                i.create_followup_message(&ctx.http, |f| f.content(text).ephemeral(true))
                    .await?;
            }
            Self::Modal(i) => {
                i.create_followup_message(&ctx.http, |f| f.content(text).ephemeral(true))
                    .await?;
            }
        }
        Ok(())
    }

    /// Post `body` as a public message after the initial response
    async fn post_follow_up(&self, ctx: &Context, body: &MessageBody) -> Result<()> {
        match self {
            Self::Command(i) => {
                i.create_followup_message(&ctx.http, |f| follow_up_data(f, body))
                    .await?;
            }
            Self::Component(i) => {
                i.create_followup_message(&ctx.http, |f| follow_up_data(f, body))
                    .await?;
            }
            Self::Modal(i) => {
                i.create_followup_message(&ctx.http, |f| follow_up_data(f, body))
                    .await?;
            }
        }
        Ok(())
    }
}

/// Send the outcome of a dispatched event back to Discord
pub async fn deliver(
    ctx: &Context,
    engine: &InteractionEngine,
    incoming: Incoming<'_>,
    outcome: Outcome,
) -> Result<()> {
    match outcome {
        Outcome::Reply(message) => {
            incoming.respond(ctx, &message).await?;
            if let PlatformMessage::EditAndCreate { create, .. } = &message {
                incoming.post_follow_up(ctx, create).await?;
            }
            Ok(())
        }
        Outcome::PendingCreate { message, config } => {
            incoming.respond(ctx, &message).await?;
            let posted = incoming.posted_message(ctx).await?;
            if let Err(e) = engine.complete_create(posted.id.0, &config).await {
                error!("❌ Failed to store {} config for message {}: {e}", config.command_name, posted.id);
                if let Err(why) = incoming.delete_response(ctx).await {
                    warn!("⚠️ Could not remove unbacked message {}: {why}", posted.id);
                }
                let text = Notice::GenericFailure.text(incoming.locale());
                incoming.follow_up(ctx, &text).await?;
            }
            Ok(())
        }
    }
}

fn response_kind(message: &PlatformMessage, can_update: bool) -> InteractionResponseType {
    match message {
        PlatformMessage::Edit(_) | PlatformMessage::EditAndCreate { .. } if can_update => {
            InteractionResponseType::UpdateMessage
        }
        PlatformMessage::Modal(_) => InteractionResponseType::Modal,
        _ => InteractionResponseType::ChannelMessageWithSource,
    }
}

fn fill<'a, 'b>(
    response: &'b mut CreateInteractionResponse<'a>,
    message: &PlatformMessage,
    can_update: bool,
) -> &'b mut CreateInteractionResponse<'a> {
    response
        .kind(response_kind(message, can_update))
        .interaction_response_data(|data| match message {
            PlatformMessage::Modal(modal) => modal_data(data, modal),
            PlatformMessage::Ephemeral(body) => message_data(data, body).ephemeral(true),
            PlatformMessage::Edit(body)
            | PlatformMessage::Create(body)
            | PlatformMessage::EditAndCreate { edit: body, .. } => message_data(data, body),
        })
}

fn follow_up_data<'a, 'b>(
    follow_up: &'b mut CreateInteractionResponseFollowup<'a>,
    body: &MessageBody,
) -> &'b mut CreateInteractionResponseFollowup<'a> {
    follow_up
        .content(&body.content)
        .set_embeds(body.embed.iter().map(embed))
        .set_components(components(&body.rows))
}

fn message_data<'a, 'b>(
    data: &'b mut CreateInteractionResponseData<'a>,
    body: &MessageBody,
) -> &'b mut CreateInteractionResponseData<'a> {
    data.content(&body.content)
        .set_embeds(body.embed.iter().map(embed))
        .set_components(components(&body.rows))
}

fn modal_data<'a, 'b>(
    data: &'b mut CreateInteractionResponseData<'a>,
    modal: &ModalBody,
) -> &'b mut CreateInteractionResponseData<'a> {
    let mut components = CreateComponents::default();
    for input in &modal.inputs {
        components.create_action_row(|row| {
            row.create_input_text(|text| {
                text.custom_id(&input.id)
                    .label(&input.label)
                    .value(&input.value)
                    .required(true)
                    .style(if input.paragraph {
                        InputTextStyle::Paragraph
                    } else {
                        InputTextStyle::Short
                    })
            })
        });
    }
    data.custom_id(&modal.custom_id)
        .title(&modal.title)
        .set_components(components)
}

fn embed(rendered: &RenderedEmbed) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed.title(&rendered.title);
    if let Some(description) = &rendered.description {
        embed.description(description);
    }
    for (name, value) in &rendered.fields {
        embed.field(name, value, false);
    }
    embed
}

fn button_style(style: ButtonStyle) -> DiscordButtonStyle {
    match style {
        ButtonStyle::Primary => DiscordButtonStyle::Primary,
        ButtonStyle::Secondary => DiscordButtonStyle::Secondary,
        ButtonStyle::Success => DiscordButtonStyle::Success,
        ButtonStyle::Danger => DiscordButtonStyle::Danger,
    }
}

fn components(rows: &[Vec<RenderedComponent>]) -> CreateComponents {
    let mut components = CreateComponents::default();
    for row in rows {
        components.create_action_row(|action_row| {
            for component in row {
                match component {
                    RenderedComponent::Button {
                        custom_id,
                        label,
                        style,
                    } => {
                        action_row.create_button(|button| {
                            button
                                .custom_id(custom_id)
                                .label(label)
                                .style(button_style(*style))
                        });
                    }
                    RenderedComponent::Select {
                        custom_id,
                        placeholder,
                        options,
                    } => {
                        action_row.create_select_menu(|menu| {
                            menu.custom_id(custom_id)
                                .placeholder(placeholder)
                                .options(|menu_options| {
                                    for option in options {
                                        menu_options.create_option(|o| {
                                            o.label(&option.label)
                                                .value(&option.value)
                                                .default_selection(option.selected)
                                        });
                                    }
                                    menu_options
                                })
                        });
                    }
                }
            }
            action_row
        });
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_from_slash_command_posts_instead() {
        let edit = PlatformMessage::Edit(MessageBody::default());
        assert_eq!(
            response_kind(&edit, true),
            InteractionResponseType::UpdateMessage
        );
        assert_eq!(
            response_kind(&edit, false),
            InteractionResponseType::ChannelMessageWithSource
        );
    }

    #[test]
    fn test_edit_and_create_updates_the_roller() {
        let message = PlatformMessage::EditAndCreate {
            edit: MessageBody::default(),
            create: MessageBody::default(),
        };
        assert_eq!(
            response_kind(&message, true),
            InteractionResponseType::UpdateMessage
        );
        assert_eq!(
            response_kind(&message, false),
            InteractionResponseType::ChannelMessageWithSource
        );
    }

    #[test]
    fn test_modal_and_ephemeral_kinds() {
        let modal = PlatformMessage::Modal(ModalBody {
            custom_id: "custom_dice\u{1e}edit".into(),
            title: "Edit".into(),
            inputs: Vec::new(),
        });
        assert_eq!(response_kind(&modal, true), InteractionResponseType::Modal);

        let ephemeral = PlatformMessage::Ephemeral(MessageBody::default());
        assert_eq!(
            response_kind(&ephemeral, true),
            InteractionResponseType::ChannelMessageWithSource
        );
    }

    #[test]
    fn test_components_keep_row_layout() {
        let rows = vec![
            vec![RenderedComponent::Button {
                custom_id: "roll\u{1e}reroll".into(),
                label: "Roll again".into(),
                style: ButtonStyle::Primary,
            }],
            vec![RenderedComponent::Button {
                custom_id: "roll\u{1e}clear".into(),
                label: "Clear".into(),
                style: ButtonStyle::Danger,
            }],
        ];
        assert_eq!(components(&rows).0.len(), 2);
    }
}
