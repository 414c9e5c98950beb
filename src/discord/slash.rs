//! Slash command registration from handler definitions

use anyhow::Result;
use log::info;
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::{Command, CommandOptionType};
use serenity::model::id::GuildId;
use serenity::prelude::Context;

use crate::commands::{CommandDefinition, OptionKind};

fn option_type(kind: OptionKind) -> CommandOptionType {
    match kind {
        OptionKind::String => CommandOptionType::String,
        OptionKind::Integer => CommandOptionType::Integer,
        OptionKind::Boolean => CommandOptionType::Boolean,
    }
}

/// Translate a neutral definition into serenity's builder
pub fn build_command(definition: &CommandDefinition) -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name(definition.name)
        .description(definition.description);
    for option in &definition.options {
        command.create_option(|o| {
            o.name(option.name)
                .description(option.description)
                .kind(option_type(option.kind))
                .required(option.required);
            for choice in &option.choices {
                o.add_string_choice(choice, choice);
            }
            if let Some(min) = option.min {
                o.min_int_value(min);
            }
            if let Some(max) = option.max {
                o.max_int_value(max);
            }
            o
        });
    }
    command
}

/// Registers all slash commands globally
pub async fn register_global_commands(
    ctx: &Context,
    definitions: &[CommandDefinition],
) -> Result<()> {
    Command::set_global_application_commands(&ctx.http, |commands| {
        for definition in definitions {
            commands.add_application_command(build_command(definition));
        }
        commands
    })
    .await?;

    info!(
        "Global slash commands registered successfully ({} commands)",
        definitions.len()
    );
    Ok(())
}

/// Registers all slash commands for a specific guild (faster for testing)
pub async fn register_guild_commands(
    ctx: &Context,
    guild_id: GuildId,
    definitions: &[CommandDefinition],
) -> Result<()> {
    guild_id
        .set_application_commands(&ctx.http, |commands| {
            for definition in definitions {
                commands.add_application_command(build_command(definition));
            }
            commands
        })
        .await?;

    info!(
        "Guild slash commands registered for guild {} ({} commands)",
        guild_id,
        definitions.len()
    );
    Ok(())
}
