// crates/warbler-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory Warbler Store
// Description: Mutex-guarded WarblerStore held entirely in memory.
// Purpose: Exercise account and graph logic without a database.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`InMemoryWarblerStore`] mirrors the relational semantics of the durable
//! store: unique usernames and emails, directional follow edges, unique likes,
//! and cascading deletes. Identifiers are allocated sequentially from 1.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::identifiers::MessageId;
use crate::core::identifiers::UserId;
use crate::core::records::DEFAULT_HEADER_IMAGE_URL;
use crate::core::records::DEFAULT_IMAGE_URL;
use crate::core::records::FeedItem;
use crate::core::records::Message;
use crate::core::records::NewMessage;
use crate::core::records::NewUser;
use crate::core::records::ProfileUpdate;
use crate::core::records::User;
use crate::core::records::UserStats;
use crate::core::time::Timestamp;
use crate::interfaces::StoreError;
use crate::interfaces::WarblerStore;

// ============================================================================
// SECTION: State
// ============================================================================

/// Mutable tables behind the store mutex.
#[derive(Debug, Default)]
struct Tables {
    /// Last allocated user row id.
    next_user: u64,
    /// Last allocated message row id.
    next_message: u64,
    /// Users keyed by id.
    users: BTreeMap<UserId, User>,
    /// Messages keyed by id.
    messages: BTreeMap<MessageId, Message>,
    /// Follow edges as (follower, followed).
    follows: BTreeSet<(UserId, UserId)>,
    /// Likes as (user, message).
    likes: BTreeSet<(UserId, MessageId)>,
}

impl Tables {
    /// Fails with a conflict when `username` or `email` is blank or owned by
    /// another user.
    fn ensure_unique(
        &self,
        username: &str,
        email: &str,
        except: Option<UserId>,
    ) -> Result<(), StoreError> {
        if username.trim().is_empty() {
            return Err(StoreError::Conflict("users.username is blank".to_string()));
        }
        if email.trim().is_empty() {
            return Err(StoreError::Conflict("users.email is blank".to_string()));
        }
        for user in self.users.values() {
            if Some(user.id) == except {
                continue;
            }
            if user.username == username {
                return Err(StoreError::Conflict("users.username".to_string()));
            }
            if user.email == email {
                return Err(StoreError::Conflict("users.email".to_string()));
            }
        }
        Ok(())
    }

    /// Fails with not-found when the user is missing.
    fn ensure_user(&self, id: UserId) -> Result<(), StoreError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("user {id}")))
        }
    }

    /// Joins messages with their authors, newest first, bounded by `limit`.
    fn feed<'a>(
        &self,
        messages: impl Iterator<Item = &'a Message>,
        limit: usize,
    ) -> Vec<FeedItem> {
        let mut items: Vec<FeedItem> = messages
            .filter_map(|message| {
                self.users.get(&message.user_id).map(|author| FeedItem {
                    message: message.clone(),
                    author_username: author.username.clone(),
                    author_image_url: author.image_url.clone(),
                })
            })
            .collect();
        sort_newest_first(&mut items, |item| &item.message);
        items.truncate(limit);
        items
    }
}

/// Sorts records newest first, breaking timestamp ties by descending id.
fn sort_newest_first<T>(items: &mut [T], message: impl Fn(&T) -> &Message) {
    items.sort_by(|a, b| {
        let (a, b) = (message(a), message(b));
        b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id))
    });
}

/// Returns the count as `u64`.
fn count(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// In-memory store.
///
/// # Invariants
/// - All table access is serialized through a single mutex.
#[derive(Debug, Default)]
pub struct InMemoryWarblerStore {
    /// Guarded tables.
    tables: Mutex<Tables>,
}

impl InMemoryWarblerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the tables.
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Io("store mutex poisoned".to_string()))
    }
}

impl WarblerStore for InMemoryWarblerStore {
    fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut tables = self.lock()?;
        tables.ensure_unique(&user.username, &user.email, None)?;
        tables.next_user += 1;
        let id = UserId::from_raw(tables.next_user)
            .ok_or_else(|| StoreError::Invalid("user id overflow".to_string()))?;
        let record = User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            image_url: user.image_url.clone().unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
            header_image_url: DEFAULT_HEADER_IMAGE_URL.to_string(),
            bio: None,
            location: None,
            password_hash: user.password_hash.clone(),
        };
        tables.users.insert(id, record.clone());
        Ok(record)
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.values().find(|user| user.username == username).cloned())
    }

    fn list_users(&self, search: Option<&str>) -> Result<Vec<User>, StoreError> {
        let needle = search.map(str::to_lowercase);
        Ok(self
            .lock()?
            .users
            .values()
            .filter(|user| {
                needle.as_ref().is_none_or(|needle| user.username.to_lowercase().contains(needle))
            })
            .cloned()
            .collect())
    }

    fn update_user(&self, id: UserId, update: &ProfileUpdate) -> Result<User, StoreError> {
        let mut tables = self.lock()?;
        tables.ensure_user(id)?;
        tables.ensure_unique(&update.username, &update.email, Some(id))?;
        let update = update.clone().normalized();
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        user.username = update.username;
        user.email = update.email;
        user.image_url = update.image_url;
        user.header_image_url = update.header_image_url;
        user.bio = update.bio;
        user.location = update.location;
        Ok(user.clone())
    }

    fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: BTreeSet<MessageId> = tables
            .messages
            .values()
            .filter(|message| message.user_id == id)
            .map(|message| message.id)
            .collect();
        tables.messages.retain(|message_id, _| !owned.contains(message_id));
        tables.follows.retain(|(follower, followed)| *follower != id && *followed != id);
        tables.likes.retain(|(user, message)| *user != id && !owned.contains(message));
        Ok(true)
    }

    fn user_stats(&self, id: UserId) -> Result<UserStats, StoreError> {
        let tables = self.lock()?;
        Ok(UserStats {
            messages: count(tables.messages.values().filter(|m| m.user_id == id).count()),
            following: count(tables.follows.iter().filter(|(f, _)| *f == id).count()),
            followers: count(tables.follows.iter().filter(|(_, f)| *f == id).count()),
            likes: count(tables.likes.iter().filter(|(u, _)| *u == id).count()),
        })
    }

    fn follow(&self, follower: UserId, followed: UserId) -> Result<(), StoreError> {
        if follower == followed {
            return Err(StoreError::Invalid("users cannot follow themselves".to_string()));
        }
        let mut tables = self.lock()?;
        tables.ensure_user(follower)?;
        tables.ensure_user(followed)?;
        tables.follows.insert((follower, followed));
        Ok(())
    }

    fn unfollow(&self, follower: UserId, followed: UserId) -> Result<bool, StoreError> {
        Ok(self.lock()?.follows.remove(&(follower, followed)))
    }

    fn following(&self, user: UserId) -> Result<Vec<User>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .follows
            .iter()
            .filter(|(follower, _)| *follower == user)
            .filter_map(|(_, followed)| tables.users.get(followed).cloned())
            .collect())
    }

    fn followers(&self, user: UserId) -> Result<Vec<User>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .follows
            .iter()
            .filter(|(_, followed)| *followed == user)
            .filter_map(|(follower, _)| tables.users.get(follower).cloned())
            .collect())
    }

    fn is_following(&self, follower: UserId, followed: UserId) -> Result<bool, StoreError> {
        Ok(self.lock()?.follows.contains(&(follower, followed)))
    }

    fn create_message(&self, message: &NewMessage) -> Result<Message, StoreError> {
        let mut tables = self.lock()?;
        tables.ensure_user(message.user_id)?;
        tables.next_message += 1;
        let id = MessageId::from_raw(tables.next_message)
            .ok_or_else(|| StoreError::Invalid("message id overflow".to_string()))?;
        let record = Message {
            id,
            text: message.text.clone(),
            timestamp: Timestamp::now(),
            user_id: message.user_id,
        };
        tables.messages.insert(id, record.clone());
        Ok(record)
    }

    fn message(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        Ok(self.lock()?.messages.get(&id).cloned())
    }

    fn delete_message(&self, id: MessageId) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        if tables.messages.remove(&id).is_none() {
            return Ok(false);
        }
        tables.likes.retain(|(_, message)| *message != id);
        Ok(true)
    }

    fn messages_by_user(&self, user: UserId, limit: usize) -> Result<Vec<Message>, StoreError> {
        let tables = self.lock()?;
        let mut messages: Vec<Message> =
            tables.messages.values().filter(|m| m.user_id == user).cloned().collect();
        sort_newest_first(&mut messages, |message| message);
        messages.truncate(limit);
        Ok(messages)
    }

    fn timeline(&self, viewer: UserId, limit: usize) -> Result<Vec<FeedItem>, StoreError> {
        let tables = self.lock()?;
        let authors: BTreeSet<UserId> = tables
            .follows
            .iter()
            .filter(|(follower, _)| *follower == viewer)
            .map(|(_, followed)| *followed)
            .chain(std::iter::once(viewer))
            .collect();
        Ok(tables.feed(
            tables.messages.values().filter(|message| authors.contains(&message.user_id)),
            limit,
        ))
    }

    fn like(&self, user: UserId, message: MessageId) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        tables.ensure_user(user)?;
        if !tables.messages.contains_key(&message) {
            return Err(StoreError::NotFound(format!("message {message}")));
        }
        tables.likes.insert((user, message));
        Ok(())
    }

    fn unlike(&self, user: UserId, message: MessageId) -> Result<bool, StoreError> {
        Ok(self.lock()?.likes.remove(&(user, message)))
    }

    fn has_liked(&self, user: UserId, message: MessageId) -> Result<bool, StoreError> {
        Ok(self.lock()?.likes.contains(&(user, message)))
    }

    fn liked_message_ids(&self, user: UserId) -> Result<Vec<MessageId>, StoreError> {
        Ok(self
            .lock()?
            .likes
            .iter()
            .filter(|(liker, _)| *liker == user)
            .map(|(_, message)| *message)
            .collect())
    }

    fn liked_messages(&self, user: UserId, limit: usize) -> Result<Vec<FeedItem>, StoreError> {
        let tables = self.lock()?;
        let liked: BTreeSet<MessageId> = tables
            .likes
            .iter()
            .filter(|(liker, _)| *liker == user)
            .map(|(_, message)| *message)
            .collect();
        Ok(tables.feed(
            tables.messages.values().filter(|message| liked.contains(&message.id)),
            limit,
        ))
    }

    fn likes_for_message(&self, message: MessageId) -> Result<Vec<UserId>, StoreError> {
        Ok(self
            .lock()?
            .likes
            .iter()
            .filter(|(_, liked)| *liked == message)
            .map(|(user, _)| *user)
            .collect())
    }
}
