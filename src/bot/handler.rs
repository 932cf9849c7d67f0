use std::{sync::Arc, time::Duration};

use serenity::{
    all::{
        ChannelId as DiscordChannelId, Command, CommandInteraction, Context,
        CreateInteractionResponse, CreateInteractionResponseFollowup,
        CreateInteractionResponseMessage, CreateMessage, EditInteractionResponse, EventHandler,
        GuildId as DiscordGuildId, Interaction, Message, Permissions, Reaction, ReactionType,
        Ready, ShardManager, UserId as DiscordUserId, VoiceState,
    },
    async_trait,
    prelude::TypeMapKey,
};
use tracing::{debug, error, info, warn};

use super::{
    access, prefix,
    render::{self, Rendered},
    slash,
};
use crate::{
    common::{
        errors::RadioResult,
        types::{ChannelId, GuildId, MessageId, UserId},
    },
    player::{
        SessionManager,
        events::SessionEvent,
        intent::{CommandContext, Intent, Reply},
    },
};

/// Client data slot for the shard manager, read back by `ping`.
pub struct ShardManagerKey;

impl TypeMapKey for ShardManagerKey {
    type Value = Arc<ShardManager>;
}

pub struct Handler {
    manager: Arc<SessionManager>,
    prefix: String,
}

impl Handler {
    pub fn new(manager: Arc<SessionManager>, prefix: String) -> Self {
        Self { manager, prefix }
    }

    /// Builds the command context and hands the intent to the manager.
    /// Voice permissions are checked here, while the cache is at hand.
    async fn run(
        &self,
        ctx: &Context,
        guild_id: DiscordGuildId,
        text_channel: DiscordChannelId,
        user_id: DiscordUserId,
        intent: Intent,
    ) -> RadioResult<Reply> {
        if intent == Intent::Ping {
            return Ok(Reply::Latency(shard_latency(ctx).await));
        }

        let (channel, permissions) = voice_presence(ctx, guild_id, user_id);
        let target = access::voice_target(channel, permissions);
        let voice_channel = access::admit(&intent, target, self.manager.catalog())?;

        let command = CommandContext {
            guild_id: GuildId(guild_id.get()),
            text_channel: ChannelId(text_channel.get()),
            requester: UserId(user_id.get()),
            voice_channel,
        };
        self.manager.dispatch(&command, intent).await
    }

    async fn slash_command(&self, ctx: &Context, command: &CommandInteraction) {
        let Some(guild_id) = command.guild_id else {
            respond_privately(ctx, command, "This command only works in a server.".into()).await;
            return;
        };

        let argument = slash::stream_argument(&command.data.options);
        let intent = match Intent::parse(&command.data.name, argument) {
            None => return,
            Some(Ok(intent)) => intent,
            Some(Err(err)) => {
                respond_privately(ctx, command, render::error_text(&err, "/list")).await;
                return;
            }
        };

        let deferred = if slash::is_private(&intent) {
            command.defer_ephemeral(&ctx.http).await
        } else {
            command.defer(&ctx.http).await
        };
        if let Err(err) = deferred {
            warn!("[{}] Could not defer /{}: {}", guild_id, command.data.name, err);
            return;
        }

        let result = self
            .run(ctx, guild_id, command.channel_id, command.user.id, intent)
            .await;

        let edit = match result {
            Ok(Reply::Private(text)) => {
                discard_deferral(ctx, command).await;
                follow_up(ctx, command, text).await;
                return;
            }
            Ok(reply) => match render::reply(reply, &self.prefix) {
                Rendered::Text(text) => EditInteractionResponse::new().content(text),
                Rendered::Embed(embed) => EditInteractionResponse::new().embed(embed),
                Rendered::Nothing => {
                    EditInteractionResponse::new().content("\u{1F4CC} Status re-posted.")
                }
            },
            Err(err) => {
                debug!("[{}] /{} failed: {}", guild_id, command.data.name, err);
                discard_deferral(ctx, command).await;
                follow_up(ctx, command, render::error_text(&err, "/list")).await;
                return;
            }
        };

        if let Err(err) = command.edit_response(&ctx.http, edit).await {
            warn!("[{}] Could not answer /{}: {}", guild_id, command.data.name, err);
        }
    }
}

/// Removes the public "thinking" placeholder before an ephemeral follow-up.
async fn discard_deferral(ctx: &Context, command: &CommandInteraction) {
    if let Err(err) = command.delete_response(&ctx.http).await {
        debug!("Could not remove deferred /{} response: {}", command.data.name, err);
    }
}

/// Ephemeral message after the response was deferred.
async fn follow_up(ctx: &Context, command: &CommandInteraction, text: String) {
    let response = CreateInteractionResponseFollowup::new()
        .content(text)
        .ephemeral(true);
    if let Err(err) = command.create_followup(&ctx.http, response).await {
        warn!("Could not answer /{}: {}", command.data.name, err);
    }
}

/// Ephemeral message as the first and only response.
async fn respond_privately(ctx: &Context, command: &CommandInteraction, text: String) {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(text)
            .ephemeral(true),
    );
    if let Err(err) = command.create_response(&ctx.http, response).await {
        warn!("Could not answer /{}: {}", command.data.name, err);
    }
}

/// The voice channel `user_id` sits in, and the bot's permissions there
/// when the cache has both the channel and the bot's member.
fn voice_presence(
    ctx: &Context,
    guild_id: DiscordGuildId,
    user_id: DiscordUserId,
) -> (Option<ChannelId>, Option<Permissions>) {
    let bot_id = ctx.cache.current_user().id;
    let Some(guild) = ctx.cache.guild(guild_id) else {
        return (None, None);
    };
    let Some(channel_id) = guild
        .voice_states
        .get(&user_id)
        .and_then(|state| state.channel_id)
    else {
        return (None, None);
    };

    let permissions = guild
        .channels
        .get(&channel_id)
        .zip(guild.members.get(&bot_id))
        .map(|(channel, member)| guild.user_permissions_in(channel, member));
    (Some(ChannelId(channel_id.get())), permissions)
}

async fn shard_latency(ctx: &Context) -> Option<Duration> {
    let shards = ctx.data.read().await.get::<ShardManagerKey>().cloned()?;
    let runners = shards.runners.lock().await;
    runners.get(&ctx.shard_id).and_then(|runner| runner.latency)
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            "{} is connected to {} guilds",
            ready.user.name,
            ready.guilds.len()
        );

        match Command::set_global_commands(&ctx.http, slash::definitions()).await {
            Ok(commands) => info!("Registered {} slash commands", commands.len()),
            Err(err) => error!("Failed to register slash commands: {}", err),
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(guild_id) = msg.guild_id else {
            return;
        };
        let Some(parsed) = prefix::parse(&msg.content, &self.prefix) else {
            return;
        };

        let result = match parsed {
            Ok(intent) => {
                self.run(&ctx, guild_id, msg.channel_id, msg.author.id, intent)
                    .await
            }
            Err(err) => Err(err),
        };

        let reply = match result {
            Ok(reply) => match render::reply(reply, &self.prefix) {
                Rendered::Text(text) => CreateMessage::new().content(text),
                Rendered::Embed(embed) => CreateMessage::new().embed(embed),
                Rendered::Nothing => {
                    // `now` re-posted the card; the command itself is clutter.
                    if let Err(err) = msg.delete(&ctx.http).await {
                        debug!("[{}] Could not delete command message: {}", guild_id, err);
                    }
                    return;
                }
            },
            Err(err) => {
                debug!("[{}] Command failed: {}", guild_id, err);
                let hint = format!("{}list", self.prefix);
                CreateMessage::new().content(render::error_text(&err, &hint))
            }
        };

        if let Err(err) = msg.channel_id.send_message(&ctx.http, reply).await {
            warn!("[{}] Could not reply in {}: {}", guild_id, msg.channel_id, err);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            self.slash_command(&ctx, &command).await;
        }
    }

    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        let (Some(guild_id), Some(user_id)) = (reaction.guild_id, reaction.user_id) else {
            return;
        };
        if user_id == ctx.cache.current_user().id {
            return;
        }
        if reaction.member.as_ref().is_some_and(|m| m.user.bot) {
            return;
        }
        let ReactionType::Unicode(glyph) = &reaction.emoji else {
            return;
        };

        let Some(reply) = self
            .manager
            .on_reaction(
                GuildId(guild_id.get()),
                MessageId(reaction.message_id.get()),
                UserId(user_id.get()),
                glyph,
            )
            .await
        else {
            return;
        };

        if let Err(err) = reaction.delete(&ctx.http).await {
            debug!("[{}] Could not remove stop reaction: {}", guild_id, err);
        }
        if let Rendered::Text(text) = render::reply(reply, &self.prefix) {
            let notice = CreateMessage::new().content(text);
            if let Err(err) = reaction.channel_id.send_message(&ctx.http, notice).await {
                warn!("[{}] Could not post stop notice: {}", guild_id, err);
            }
        }
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        if new.user_id != ctx.cache.current_user().id || new.channel_id.is_some() {
            return;
        }
        let Some(guild_id) = new.guild_id else {
            return;
        };
        self.manager.submit(SessionEvent::VoiceDisconnected {
            guild_id: GuildId(guild_id.get()),
            channel_id: old
                .and_then(|state| state.channel_id)
                .map(|channel| ChannelId(channel.get())),
        });
    }
}

