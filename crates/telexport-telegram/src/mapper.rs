// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Projection of raw TL objects into the core domain types.
//!
//! Everything here is pure: TL in, domain values out. Media classification
//! builds a [`MediaFacets`] record and defers to the core's total
//! `classify_media`, so the closed-enum invariant holds no matter what
//! combination of TL facets arrives.

use std::collections::HashMap;

use chrono::DateTime;
use grammers_tl_types as tl;

use telexport_core::{classify_media, ChatKind, ChatRef, MediaFacets, Message, Sender};

/// Build a [`ChatRef`] plus addressable peer from a `contacts.resolveUsername`
/// response. Returns `None` when the response names a peer its own entity
/// lists do not contain.
pub fn chat_ref_from_resolved(
    resolved: &tl::types::contacts::ResolvedPeer,
) -> Option<(ChatRef, tl::enums::InputPeer)> {
    match resolved.peer {
        tl::enums::Peer::User(tl::types::PeerUser { user_id }) => {
            let user = find_user(&resolved.users, user_id)?;
            let input_peer = tl::enums::InputPeer::User(tl::types::InputPeerUser {
                user_id,
                access_hash: user.access_hash.unwrap_or(0),
            });
            Some((chat_ref_from_user(user), input_peer))
        }
        tl::enums::Peer::Channel(tl::types::PeerChannel { channel_id }) => {
            let channel = find_channel(&resolved.chats, channel_id)?;
            let input_peer = tl::enums::InputPeer::Channel(tl::types::InputPeerChannel {
                channel_id,
                access_hash: channel.access_hash.unwrap_or(0),
            });
            Some((chat_ref_from_channel(channel), input_peer))
        }
        tl::enums::Peer::Chat(tl::types::PeerChat { chat_id }) => {
            let group = find_group(&resolved.chats, chat_id)?;
            let input_peer =
                tl::enums::InputPeer::Chat(tl::types::InputPeerChat { chat_id });
            Some((chat_ref_from_group(group), input_peer))
        }
    }
}

/// Rebuild a [`ChatRef`] for a known id from a history response's entity
/// lists (used by the id-probe path of `resolve`).
pub fn chat_ref_from_history(
    chat_id: i64,
    response: &tl::enums::messages::Messages,
) -> Option<ChatRef> {
    let (chats, users) = entity_lists(response)?;
    if let Some(user) = find_user(users, chat_id) {
        return Some(chat_ref_from_user(user));
    }
    if let Some(channel) = find_channel(chats, chat_id) {
        return Some(chat_ref_from_channel(channel));
    }
    find_group(chats, chat_id).map(chat_ref_from_group)
}

/// Project every content message of a history response, newest-first as
/// the wire delivers them.
pub fn project_messages(response: tl::enums::messages::Messages) -> Vec<Message> {
    let (raw_messages, chats, users) = match response {
        tl::enums::messages::Messages::Messages(m) => (m.messages, m.chats, m.users),
        tl::enums::messages::Messages::Slice(m) => (m.messages, m.chats, m.users),
        tl::enums::messages::Messages::ChannelMessages(m) => (m.messages, m.chats, m.users),
        tl::enums::messages::Messages::NotModified(_) => return Vec::new(),
    };

    let senders = SenderDirectory::new(&chats, &users);

    raw_messages
        .into_iter()
        .filter_map(|raw| match raw {
            tl::enums::Message::Message(message) => Some(project_message(message, &senders)),
            // Service messages (joins, pins, topic events) carry no
            // exportable content.
            tl::enums::Message::Service(_) | tl::enums::Message::Empty(_) => None,
        })
        .collect()
}

fn project_message(raw: tl::types::Message, senders: &SenderDirectory) -> Message {
    let facets = raw.media.as_ref().map(media_facets).unwrap_or_default();
    let media_type = classify_media(facets);
    let has_media = raw
        .media
        .as_ref()
        .map(|m| !matches!(m, tl::enums::MessageMedia::Empty))
        .unwrap_or(false);

    let (reply_to_id, topic_id) = reply_header(raw.reply_to.as_ref());

    Message {
        id: raw.id as i64,
        date: DateTime::from_timestamp(raw.date as i64, 0).unwrap_or_default(),
        text: raw.message,
        sender: raw.from_id.as_ref().and_then(|peer| senders.lookup(peer)),
        views: raw.views.map(|v| v as i64),
        forwards: raw.forwards.map(|v| v as i64),
        replies: raw.replies.as_ref().map(|r| {
            let tl::enums::MessageReplies::Replies(replies) = r;
            replies.replies as i64
        }),
        reactions: raw.reactions.as_ref().map(reaction_total),
        pinned: raw.pinned,
        silent: raw.silent,
        post: raw.post,
        noforwards: raw.noforwards,
        media_type,
        has_media,
        reply_to_id,
        topic_id,
        edit_date: raw
            .edit_date
            .and_then(|ts| DateTime::from_timestamp(ts as i64, 0)),
    }
}

/// Extract reply and forum-topic ids from a reply header.
fn reply_header(header: Option<&tl::enums::MessageReplyHeader>) -> (Option<i64>, Option<i64>) {
    match header {
        Some(tl::enums::MessageReplyHeader::Header(h)) => {
            let reply_to = h.reply_to_msg_id.map(|id| id as i64);
            let topic = if h.forum_topic {
                h.reply_to_top_id.or(h.reply_to_msg_id).map(|id| id as i64)
            } else {
                None
            };
            (reply_to, topic)
        }
        _ => (None, None),
    }
}

fn reaction_total(reactions: &tl::enums::MessageReactions) -> i64 {
    let tl::enums::MessageReactions::Reactions(reactions) = reactions;
    reactions
        .results
        .iter()
        .map(|r| {
            let tl::enums::ReactionCount::Count(count) = r;
            count.count as i64
        })
        .sum()
}

/// Facets for the core's fixed-order media classification.
///
/// The `document` facet is only set for documents that carry no more
/// specific attribute, keeping the classification order meaningful.
fn media_facets(media: &tl::enums::MessageMedia) -> MediaFacets {
    let mut facets = MediaFacets::default();
    match media {
        tl::enums::MessageMedia::Photo(_) => facets.photo = true,
        tl::enums::MessageMedia::Document(document_media) => {
            document_facets(document_media, &mut facets)
        }
        tl::enums::MessageMedia::WebPage(_) => facets.link = true,
        tl::enums::MessageMedia::Poll(_) => facets.poll = true,
        tl::enums::MessageMedia::Empty => {}
        // Geo, contacts, dice, invoices and friends have no dedicated
        // kind; they surface as generic documents.
        _ => facets.document = true,
    }
    facets
}

fn document_facets(media: &tl::types::MessageMediaDocument, facets: &mut MediaFacets) {
    let Some(tl::enums::Document::Document(document)) = media.document.as_ref() else {
        facets.document = true;
        return;
    };

    for attribute in &document.attributes {
        match attribute {
            tl::enums::DocumentAttribute::Video(_) => facets.video = true,
            tl::enums::DocumentAttribute::Audio(audio) => {
                if audio.voice {
                    facets.voice = true;
                } else {
                    facets.audio = true;
                }
            }
            tl::enums::DocumentAttribute::Sticker(_) => facets.sticker = true,
            _ => {}
        }
    }

    if !(facets.video || facets.audio || facets.voice || facets.sticker) {
        facets.document = true;
    }
}

/// Sender lookup across a response's user and chat entity lists.
struct SenderDirectory {
    users: HashMap<i64, Sender>,
    chats: HashMap<i64, Sender>,
}

impl SenderDirectory {
    fn new(chats: &[tl::enums::Chat], users: &[tl::enums::User]) -> Self {
        let mut user_map = HashMap::new();
        for user in users {
            if let tl::enums::User::User(user) = user {
                user_map.insert(
                    user.id,
                    Sender {
                        id: user.id,
                        username: primary_username(user.username.as_ref(), user.usernames.as_ref()),
                        display: display_name(user.first_name.as_deref(), user.last_name.as_deref()),
                        is_bot: Some(user.bot),
                        verified: Some(user.verified),
                    },
                );
            }
        }

        let mut chat_map = HashMap::new();
        for chat in chats {
            match chat {
                tl::enums::Chat::Channel(channel) => {
                    chat_map.insert(
                        channel.id,
                        Sender {
                            id: channel.id,
                            username: primary_username(
                                channel.username.as_ref(),
                                channel.usernames.as_ref(),
                            ),
                            display: Some(channel.title.clone()),
                            is_bot: None,
                            verified: Some(channel.verified),
                        },
                    );
                }
                tl::enums::Chat::Chat(group) => {
                    chat_map.insert(
                        group.id,
                        Sender {
                            id: group.id,
                            username: None,
                            display: Some(group.title.clone()),
                            is_bot: None,
                            verified: None,
                        },
                    );
                }
                _ => {}
            }
        }

        Self {
            users: user_map,
            chats: chat_map,
        }
    }

    fn lookup(&self, peer: &tl::enums::Peer) -> Option<Sender> {
        match peer {
            tl::enums::Peer::User(tl::types::PeerUser { user_id }) => {
                self.users.get(user_id).cloned()
            }
            tl::enums::Peer::Channel(tl::types::PeerChannel { channel_id }) => {
                self.chats.get(channel_id).cloned()
            }
            tl::enums::Peer::Chat(tl::types::PeerChat { chat_id }) => {
                self.chats.get(chat_id).cloned()
            }
        }
    }
}

fn entity_lists(
    response: &tl::enums::messages::Messages,
) -> Option<(&[tl::enums::Chat], &[tl::enums::User])> {
    match response {
        tl::enums::messages::Messages::Messages(m) => Some((&m.chats, &m.users)),
        tl::enums::messages::Messages::Slice(m) => Some((&m.chats, &m.users)),
        tl::enums::messages::Messages::ChannelMessages(m) => Some((&m.chats, &m.users)),
        tl::enums::messages::Messages::NotModified(_) => None,
    }
}

fn find_user(users: &[tl::enums::User], id: i64) -> Option<&tl::types::User> {
    users.iter().find_map(|user| match user {
        tl::enums::User::User(user) if user.id == id => Some(user),
        _ => None,
    })
}

fn find_channel(chats: &[tl::enums::Chat], id: i64) -> Option<&tl::types::Channel> {
    chats.iter().find_map(|chat| match chat {
        tl::enums::Chat::Channel(channel) if channel.id == id => Some(channel),
        _ => None,
    })
}

fn find_group(chats: &[tl::enums::Chat], id: i64) -> Option<&tl::types::Chat> {
    chats.iter().find_map(|chat| match chat {
        tl::enums::Chat::Chat(group) if group.id == id => Some(group),
        _ => None,
    })
}

fn chat_ref_from_user(user: &tl::types::User) -> ChatRef {
    ChatRef {
        canonical_id: user.id,
        kind: ChatKind::User,
        username: primary_username(user.username.as_ref(), user.usernames.as_ref()),
        title: display_name(user.first_name.as_deref(), user.last_name.as_deref())
            .unwrap_or_else(|| "Unknown".to_string()),
        description: None,
        member_count: None,
        verified: Some(user.verified),
    }
}

fn chat_ref_from_channel(channel: &tl::types::Channel) -> ChatRef {
    ChatRef {
        canonical_id: channel.id,
        // Megagroups behave like groups; broadcast channels are channels.
        kind: if channel.megagroup {
            ChatKind::Group
        } else {
            ChatKind::Channel
        },
        username: primary_username(channel.username.as_ref(), channel.usernames.as_ref()),
        title: channel.title.clone(),
        description: None,
        member_count: channel.participants_count.map(|c| c as i64),
        verified: Some(channel.verified),
    }
}

fn chat_ref_from_group(group: &tl::types::Chat) -> ChatRef {
    ChatRef {
        canonical_id: group.id,
        kind: ChatKind::Group,
        // Basic groups carry no username; such chats fail the public
        // check at the resolver.
        username: None,
        title: group.title.clone(),
        description: None,
        member_count: Some(group.participants_count as i64),
        verified: None,
    }
}

/// The legacy `username` field, or the first active collectible username.
fn primary_username(
    legacy: Option<&String>,
    collectibles: Option<&Vec<tl::enums::Username>>,
) -> Option<String> {
    if let Some(name) = legacy {
        return Some(name.clone());
    }
    collectibles.and_then(|list| {
        list.iter().find_map(|u| {
            let tl::enums::Username::Username(u) = u;
            u.active.then(|| u.username.clone())
        })
    })
}

fn display_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    match (first, last) {
        (Some(first), Some(last)) => Some(format!("{first} {last}")),
        (Some(first), None) => Some(first.to_string()),
        (None, Some(last)) => Some(last.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_joins_parts() {
        assert_eq!(
            display_name(Some("Alice"), Some("Liddell")),
            Some("Alice Liddell".to_string())
        );
        assert_eq!(display_name(Some("Alice"), None), Some("Alice".to_string()));
        assert_eq!(display_name(None, None), None);
    }
}
