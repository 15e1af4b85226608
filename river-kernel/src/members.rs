//! Members sub-projection
//!
//! Shared by every content kind: who joined, invited or left (pending and
//! confirmed), per-member key solicitations, and member metadata.

use crate::error::RiverError;
use crate::notify::{EncryptedContentKind, EncryptionEvent, Notifier, StreamStateEvent};
use crate::timeline::{DecryptedContent, StreamTimelineEvent};
use river_model::crypto::user_id_from_address;
use river_model::{Address, StreamId};
use river_proto::member_payload::{self, KeyFulfillment, KeySolicitation, Nft};
use river_proto::{EncryptedData, ErrCode, MemberPayload, MembershipOp, Snapshot, WrappedEncryptedData};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySolicitationContent {
    pub device_key: String,
    pub fallback_key: String,
    pub is_new_device: bool,
    /// Always sorted.
    pub session_ids: Vec<String>,
    pub src_event_id: String,
}

impl KeySolicitationContent {
    fn from_proto(s: &KeySolicitation, src_event_id: &str) -> Self {
        let mut session_ids = s.session_ids.clone();
        session_ids.sort();
        Self {
            device_key: s.device_key.clone(),
            fallback_key: s.fallback_key.clone(),
            is_new_device: s.is_new_device,
            session_ids,
            src_event_id: src_event_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamMember {
    pub user_id: String,
    pub user_address: Vec<u8>,
    pub miniblock_num: Option<i64>,
    pub event_num: Option<i64>,
    pub solicitations: Vec<KeySolicitationContent>,
    pub encrypted_username: Option<WrappedEncryptedData>,
    pub encrypted_display_name: Option<WrappedEncryptedData>,
    pub ens_address: Option<Vec<u8>>,
    pub nft: Option<Nft>,
}

impl StreamMember {
    fn new(user_id: String, user_address: Vec<u8>) -> Self {
        Self {
            user_id,
            user_address,
            miniblock_num: None,
            event_num: None,
            solicitations: Vec::new(),
            encrypted_username: None,
            encrypted_display_name: None,
            ens_address: None,
            nft: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Membership sets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStage {
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, Default)]
pub struct Membership {
    pub joined_users: BTreeSet<String>,
    pub invited_users: BTreeSet<String>,
    pub left_users: BTreeSet<String>,
    pub pending_joined_users: BTreeSet<String>,
    pub pending_invited_users: BTreeSet<String>,
    pub pending_left_users: BTreeSet<String>,
    /// Appended membership events awaiting their miniblock, by event hash.
    pub pending_membership_events: HashMap<String, member_payload::Membership>,
}

impl Membership {
    pub fn is_member(&self, op: MembershipOp, user_id: &str) -> bool {
        match op {
            MembershipOp::SoJoin => self.joined_users.contains(user_id),
            MembershipOp::SoInvite => self.invited_users.contains(user_id),
            MembershipOp::SoLeave => self.left_users.contains(user_id),
            MembershipOp::SoUnspecified => false,
        }
    }

    pub fn knows(&self, user_id: &str) -> bool {
        self.joined_users.contains(user_id)
            || self.invited_users.contains(user_id)
            || self.left_users.contains(user_id)
            || self.pending_joined_users.contains(user_id)
            || self.pending_invited_users.contains(user_id)
            || self.pending_left_users.contains(user_id)
    }

    pub fn participants(&self) -> BTreeSet<String> {
        self.joined_users
            .iter()
            .chain(self.invited_users.iter())
            .chain(self.left_users.iter())
            .cloned()
            .collect()
    }

    pub fn joined_participants(&self) -> BTreeSet<String> {
        self.joined_users.clone()
    }

    pub fn joined_or_invited_participants(&self) -> BTreeSet<String> {
        self.joined_users.union(&self.invited_users).cloned().collect()
    }

    fn clear_pending(&mut self, user_id: &str) {
        self.pending_joined_users.remove(user_id);
        self.pending_invited_users.remove(user_id);
        self.pending_left_users.remove(user_id);
    }

    pub fn apply_membership_event(
        &mut self,
        stream_id: &StreamId,
        user_id: &str,
        op: MembershipOp,
        stage: MembershipStage,
        notifier: &Notifier,
    ) {
        let user = user_id.to_string();
        match stage {
            MembershipStage::Pending => {
                self.clear_pending(user_id);
                let set = match op {
                    MembershipOp::SoJoin => &mut self.pending_joined_users,
                    MembershipOp::SoInvite => &mut self.pending_invited_users,
                    MembershipOp::SoLeave => &mut self.pending_left_users,
                    MembershipOp::SoUnspecified => return,
                };
                set.insert(user.clone());
                notifier.state(StreamStateEvent::PendingMembershipUpdated { stream_id: *stream_id, user_id: user });
            }
            MembershipStage::Confirmed => {
                self.clear_pending(user_id);
                let changed = match op {
                    MembershipOp::SoJoin => {
                        self.invited_users.remove(user_id);
                        self.left_users.remove(user_id);
                        self.joined_users.insert(user.clone())
                    }
                    MembershipOp::SoInvite => {
                        self.left_users.remove(user_id);
                        self.invited_users.insert(user.clone())
                    }
                    MembershipOp::SoLeave => {
                        self.joined_users.remove(user_id);
                        self.invited_users.remove(user_id);
                        self.left_users.insert(user.clone())
                    }
                    MembershipOp::SoUnspecified => return,
                };
                if changed {
                    let stream_id = *stream_id;
                    let user_id = user.clone();
                    notifier.state(match op {
                        MembershipOp::SoJoin => StreamStateEvent::NewUserJoined { stream_id, user_id },
                        MembershipOp::SoInvite => StreamStateEvent::NewUserInvited { stream_id, user_id },
                        _ => StreamStateEvent::UserLeft { stream_id, user_id },
                    });
                }
                notifier.state(StreamStateEvent::MembershipUpdated { stream_id: *stream_id, user_id: user });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Key solicitations
// ---------------------------------------------------------------------------

/// Replace any solicitation from the same device with `solicitation`.
pub fn apply_solicitation(
    stream_id: &StreamId,
    member: &mut StreamMember,
    event_id: &str,
    solicitation: &KeySolicitation,
    notifier: &Notifier,
) {
    member.solicitations.retain(|s| s.device_key != solicitation.device_key);
    let content = KeySolicitationContent::from_proto(solicitation, event_id);
    member.solicitations.push(content.clone());
    notifier.encryption(EncryptionEvent::NewKeySolicitation {
        stream_id: *stream_id,
        from_user_id: member.user_id.clone(),
        solicitation: content,
    });
}

/// Strike fulfilled session ids from the device's open solicitation. An
/// unknown device key is ignored.
pub fn apply_fulfillment(stream_id: &StreamId, member: &mut StreamMember, fulfillment: &KeyFulfillment, notifier: &Notifier) {
    let Some(index) = member.solicitations.iter().position(|s| s.device_key == fulfillment.device_key) else {
        return;
    };
    let mut fulfilled = fulfillment.session_ids.clone();
    fulfilled.sort();
    let prev = &member.solicitations[index];
    let updated = KeySolicitationContent {
        device_key: prev.device_key.clone(),
        fallback_key: prev.fallback_key.clone(),
        is_new_device: false,
        session_ids: sorted_difference(&prev.session_ids, &fulfilled),
        src_event_id: prev.src_event_id.clone(),
    };
    member.solicitations[index] = updated.clone();
    notifier.encryption(EncryptionEvent::UpdatedKeySolicitation {
        stream_id: *stream_id,
        from_user_id: member.user_id.clone(),
        solicitation: updated,
    });
}

/// `a \ b` for two ascending lists, in one linear pass.
pub fn sorted_difference(a: &[String], b: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(a.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() {
        if j >= b.len() {
            out.extend_from_slice(&a[i..]);
            break;
        }
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i].clone());
                i += 1;
            }
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Member metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetadataField {
    Username,
    DisplayName,
}

/// Decrypted usernames and display names, plus plaintext ENS/NFT info.
#[derive(Debug, Clone, Default)]
pub struct MemberMetadata {
    pub usernames: HashMap<String, String>,
    pub display_names: HashMap<String, String>,
    pub ens_addresses: HashMap<String, Address>,
    pub nfts: HashMap<String, Nft>,
    awaiting_plaintext: HashMap<String, (String, MetadataField)>,
}

impl MemberMetadata {
    fn request_decryption(
        &mut self,
        stream_id: &StreamId,
        event_id: &str,
        user_id: &str,
        field: MetadataField,
        data: &EncryptedData,
        notifier: &Notifier,
    ) {
        self.awaiting_plaintext.insert(event_id.to_string(), (user_id.to_string(), field));
        notifier.encryption(EncryptionEvent::NewEncryptedContent {
            stream_id: *stream_id,
            event_id: event_id.to_string(),
            kind: EncryptedContentKind::Text,
            content: data.clone(),
        });
    }

    fn on_decrypted_text(&mut self, stream_id: &StreamId, event_id: &str, text: &str, notifier: &Notifier) {
        let Some((user_id, field)) = self.awaiting_plaintext.remove(event_id) else {
            return;
        };
        let stream_id = *stream_id;
        match field {
            MetadataField::Username => {
                self.usernames.insert(user_id.clone(), text.to_string());
                notifier.state(StreamStateEvent::UsernameUpdated { stream_id, user_id });
            }
            MetadataField::DisplayName => {
                self.display_names.insert(user_id.clone(), text.to_string());
                notifier.state(StreamStateEvent::DisplayNameUpdated { stream_id, user_id });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Members {
    stream_id: StreamId,
    pub joined: HashMap<String, StreamMember>,
    pub membership: Membership,
    pub metadata: MemberMetadata,
}

fn non_member(what: &str, user_id: &str) -> RiverError {
    RiverError::new(ErrCode::PermissionDenied, format!("{} from non-member {}", what, user_id))
}

impl Members {
    pub fn new(stream_id: StreamId) -> Self {
        Self {
            stream_id,
            joined: HashMap::new(),
            membership: Membership::default(),
            metadata: MemberMetadata::default(),
        }
    }

    pub fn apply_snapshot(&mut self, event_id: &str, snapshot: &Snapshot, notifier: &Notifier) -> Result<(), RiverError> {
        let Some(members) = &snapshot.members else {
            return Ok(());
        };
        for member in &members.joined {
            let address = Address::try_from(member.user_address.as_slice()).map_err(|_| {
                RiverError::new(ErrCode::BadAddress, format!("bad member address length {}", member.user_address.len()))
            })?;
            let user_id = user_id_from_address(&address);
            let mut state = StreamMember::new(user_id.clone(), member.user_address.clone());
            state.miniblock_num = Some(member.miniblock_num);
            state.event_num = Some(member.event_num);
            state.solicitations = member
                .solicitations
                .iter()
                .map(|s| KeySolicitationContent::from_proto(s, event_id))
                .collect();
            state.encrypted_username = member.username.clone();
            state.encrypted_display_name = member.display_name.clone();
            state.ens_address = (!member.ens_address.is_empty()).then(|| member.ens_address.clone());
            state.nft = member.nft.clone();
            self.apply_member_metadata(&state, notifier);
            self.joined.insert(user_id.clone(), state);
            self.membership
                .apply_membership_event(&self.stream_id, &user_id, MembershipOp::SoJoin, MembershipStage::Confirmed, notifier);
        }
        let mut with_solicitations: Vec<(String, Vec<KeySolicitationContent>)> = self
            .joined
            .values()
            .map(|m| (m.user_id.clone(), m.solicitations.clone()))
            .collect();
        with_solicitations.sort_by(|a, b| a.0.cmp(&b.0));
        notifier.encryption(EncryptionEvent::InitKeySolicitations {
            stream_id: self.stream_id,
            members: with_solicitations,
        });
        Ok(())
    }

    fn apply_member_metadata(&mut self, member: &StreamMember, notifier: &Notifier) {
        let wrapped = [
            (member.encrypted_username.as_ref(), MetadataField::Username),
            (member.encrypted_display_name.as_ref(), MetadataField::DisplayName),
        ];
        for (data, field) in wrapped {
            let Some(WrappedEncryptedData { data: Some(data), event_hash, .. }) = data else {
                continue;
            };
            if event_hash.is_empty() {
                continue;
            }
            let event_id = hex::encode(event_hash);
            self.metadata
                .request_decryption(&self.stream_id, &event_id, &member.user_id, field, data, notifier);
        }
        if let Some(ens) = member.ens_address.as_deref().and_then(|b| Address::try_from(b).ok()) {
            self.metadata.ens_addresses.insert(member.user_id.clone(), ens);
        }
        if let Some(nft) = &member.nft {
            self.metadata.nfts.insert(member.user_id.clone(), nft.clone());
        }
    }

    /// Membership changes are recorded as pending until their miniblock is sealed.
    pub fn append_event(
        &mut self,
        event: &StreamTimelineEvent,
        payload: &MemberPayload,
        notifier: &Notifier,
    ) -> Result<(), RiverError> {
        let stream_id = self.stream_id;
        let creator = event.creator_user_id.as_str();
        use member_payload::Content;
        match &payload.content {
            Some(Content::Membership(membership)) => {
                self.membership
                    .pending_membership_events
                    .insert(event.hash_str.clone(), membership.clone());
                let user_id = user_id_of(&membership.user_address)?;
                let op = MembershipOp::try_from(membership.op).unwrap_or(MembershipOp::SoUnspecified);
                match op {
                    MembershipOp::SoJoin => {
                        if self.joined.contains_key(&user_id) {
                            tracing::debug!(stream_id = %stream_id, user_id = %user_id, "user already joined");
                            return Ok(());
                        }
                        let mut member = StreamMember::new(user_id.clone(), membership.user_address.clone());
                        member.miniblock_num = event.miniblock_num();
                        member.event_num = Some(event.event_num);
                        self.joined.insert(user_id.clone(), member);
                    }
                    MembershipOp::SoLeave => {
                        self.joined.remove(&user_id);
                    }
                    _ => {}
                }
                self.membership
                    .apply_membership_event(&stream_id, &user_id, op, MembershipStage::Pending, notifier);
            }
            Some(Content::KeySolicitation(solicitation)) => {
                let member = self.joined.get_mut(creator).ok_or_else(|| non_member("key solicitation", creator))?;
                apply_solicitation(&stream_id, member, &event.hash_str, solicitation, notifier);
            }
            Some(Content::KeyFulfillment(fulfillment)) => {
                let user_id = user_id_of(&fulfillment.user_address)?;
                let member = self.joined.get_mut(&user_id).ok_or_else(|| non_member("key fulfillment", &user_id))?;
                apply_fulfillment(&stream_id, member, fulfillment, notifier);
            }
            Some(Content::Username(data)) | Some(Content::DisplayName(data)) => {
                let field = if matches!(payload.content, Some(Content::Username(_))) {
                    MetadataField::Username
                } else {
                    MetadataField::DisplayName
                };
                let member = self.joined.get_mut(creator).ok_or_else(|| non_member("member metadata", creator))?;
                let wrapped = Some(WrappedEncryptedData {
                    data: Some(data.clone()),
                    event_num: event.event_num,
                    event_hash: event.remote_event().map(|e| e.hash.to_vec()).unwrap_or_default(),
                });
                match field {
                    MetadataField::Username => member.encrypted_username = wrapped,
                    MetadataField::DisplayName => member.encrypted_display_name = wrapped,
                }
                self.metadata
                    .request_decryption(&stream_id, &event.hash_str, creator, field, data, notifier);
            }
            Some(Content::EnsAddress(raw)) => {
                let member = self.joined.get_mut(creator).ok_or_else(|| non_member("ens address", creator))?;
                member.ens_address = Some(raw.clone());
                match Address::try_from(raw.as_slice()) {
                    Ok(addr) => {
                        self.metadata.ens_addresses.insert(creator.to_string(), addr);
                    }
                    Err(_) => {
                        self.metadata.ens_addresses.remove(creator);
                    }
                }
                notifier.state(StreamStateEvent::EnsAddressUpdated { stream_id, user_id: creator.to_string() });
            }
            Some(Content::Nft(nft)) => {
                let member = self.joined.get_mut(creator).ok_or_else(|| non_member("nft", creator))?;
                member.nft = Some(nft.clone());
                self.metadata.nfts.insert(creator.to_string(), nft.clone());
                notifier.state(StreamStateEvent::NftUpdated { stream_id, user_id: creator.to_string() });
            }
            None => {}
        }
        Ok(())
    }

    /// Older history arriving by scrollback. Membership is backfilled only
    /// for users the snapshot and later events say nothing about; events
    /// arrive latest-first, so the newest historical op wins.
    pub fn prepend_event(
        &mut self,
        event: &StreamTimelineEvent,
        payload: &MemberPayload,
        notifier: &Notifier,
    ) -> Result<(), RiverError> {
        let Some(member_payload::Content::Membership(membership)) = &payload.content else {
            return Ok(());
        };
        let user_id = user_id_of(&membership.user_address)?;
        if self.membership.knows(&user_id) {
            return Ok(());
        }
        let op = MembershipOp::try_from(membership.op).unwrap_or(MembershipOp::SoUnspecified);
        if op == MembershipOp::SoJoin {
            let mut member = StreamMember::new(user_id.clone(), membership.user_address.clone());
            member.miniblock_num = event.miniblock_num();
            member.event_num = Some(event.event_num);
            self.joined.insert(user_id.clone(), member);
        }
        self.membership
            .apply_membership_event(&self.stream_id, &user_id, op, MembershipStage::Confirmed, notifier);
        Ok(())
    }

    pub fn on_confirmed_event(&mut self, event: &StreamTimelineEvent, payload: &MemberPayload, notifier: &Notifier) {
        if !matches!(payload.content, Some(member_payload::Content::Membership(_))) {
            return;
        }
        let Some(membership) = self.membership.pending_membership_events.remove(&event.hash_str) else {
            return;
        };
        let Ok(user_id) = user_id_of(&membership.user_address) else {
            return;
        };
        if let Some(member) = self.joined.get_mut(&user_id) {
            member.miniblock_num = event.miniblock_num();
            member.event_num = Some(event.event_num);
        }
        let op = MembershipOp::try_from(membership.op).unwrap_or(MembershipOp::SoUnspecified);
        self.membership
            .apply_membership_event(&self.stream_id, &user_id, op, MembershipStage::Confirmed, notifier);
    }

    pub fn on_decrypted_content(&mut self, event_id: &str, content: &DecryptedContent, notifier: &Notifier) {
        if let DecryptedContent::Text(text) = content {
            self.metadata.on_decrypted_text(&self.stream_id, event_id, text, notifier);
        }
    }

    pub fn is_member_joined(&self, user_id: &str) -> bool {
        self.membership.joined_users.contains(user_id)
    }

    pub fn is_member(&self, op: MembershipOp, user_id: &str) -> bool {
        self.membership.is_member(op, user_id)
    }

    pub fn participants(&self) -> BTreeSet<String> {
        self.membership.participants()
    }

    pub fn joined_participants(&self) -> BTreeSet<String> {
        self.membership.joined_participants()
    }

    pub fn joined_or_invited_participants(&self) -> BTreeSet<String> {
        self.membership.joined_or_invited_participants()
    }

    pub fn get(&self, user_id: &str) -> Option<&StreamMember> {
        self.joined.get(user_id)
    }
}

fn user_id_of(address: &[u8]) -> Result<String, RiverError> {
    let addr = Address::try_from(address)
        .map_err(|_| RiverError::new(ErrCode::BadAddress, format!("bad user address length {}", address.len())))?;
    Ok(user_id_from_address(&addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use river_model::StreamKind;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sorted_difference() {
        assert_eq!(sorted_difference(&ids(&["a", "b", "c", "e"]), &ids(&["b", "d", "e"])), ids(&["a", "c"]));
        assert_eq!(sorted_difference(&ids(&["a"]), &ids(&[])), ids(&["a"]));
        assert!(sorted_difference(&ids(&[]), &ids(&["a"])).is_empty());
    }

    #[test]
    fn test_solicitation_replaced_per_device() {
        let stream_id = StreamId::random(StreamKind::Channel);
        let notifier = Notifier::new(16);
        let mut rx = notifier.subscribe_encryption();
        let mut member = StreamMember::new("0xA".into(), vec![1; 20]);
        let sol = KeySolicitation {
            device_key: "dev1".into(),
            fallback_key: "fb".into(),
            is_new_device: true,
            session_ids: ids(&["s3", "s1"]),
        };
        apply_solicitation(&stream_id, &mut member, "e1", &sol, &notifier);
        apply_solicitation(&stream_id, &mut member, "e2", &sol, &notifier);
        assert_eq!(member.solicitations.len(), 1);
        assert_eq!(member.solicitations[0].session_ids, ids(&["s1", "s3"]));
        assert_eq!(member.solicitations[0].src_event_id, "e2");
        assert!(matches!(rx.try_recv(), Ok(EncryptionEvent::NewKeySolicitation { .. })));
    }

    #[test]
    fn test_fulfillment_strikes_sessions() {
        let stream_id = StreamId::random(StreamKind::Channel);
        let notifier = Notifier::new(16);
        let mut member = StreamMember::new("0xA".into(), vec![1; 20]);
        let sol = KeySolicitation {
            device_key: "dev1".into(),
            fallback_key: "fb".into(),
            is_new_device: true,
            session_ids: ids(&["s1", "s2", "s3"]),
        };
        apply_solicitation(&stream_id, &mut member, "e1", &sol, &notifier);

        let unknown = KeyFulfillment { user_address: vec![1; 20], device_key: "other".into(), session_ids: ids(&["s1"]) };
        apply_fulfillment(&stream_id, &mut member, &unknown, &notifier);
        assert_eq!(member.solicitations[0].session_ids.len(), 3);

        let done = KeyFulfillment { user_address: vec![1; 20], device_key: "dev1".into(), session_ids: ids(&["s2", "s1"]) };
        apply_fulfillment(&stream_id, &mut member, &done, &notifier);
        assert_eq!(member.solicitations[0].session_ids, ids(&["s3"]));
        assert!(!member.solicitations[0].is_new_device);
    }

    #[test]
    fn test_membership_stages() {
        let stream_id = StreamId::random(StreamKind::Channel);
        let notifier = Notifier::new(16);
        let mut m = Membership::default();
        m.apply_membership_event(&stream_id, "u", MembershipOp::SoJoin, MembershipStage::Pending, &notifier);
        assert!(m.pending_joined_users.contains("u"));
        assert!(!m.is_member(MembershipOp::SoJoin, "u"));

        m.apply_membership_event(&stream_id, "u", MembershipOp::SoJoin, MembershipStage::Confirmed, &notifier);
        assert!(m.is_member(MembershipOp::SoJoin, "u"));
        assert!(m.pending_joined_users.is_empty());

        m.apply_membership_event(&stream_id, "u", MembershipOp::SoLeave, MembershipStage::Confirmed, &notifier);
        assert!(!m.is_member(MembershipOp::SoJoin, "u"));
        assert!(m.participants().contains("u"));
        assert!(m.joined_or_invited_participants().is_empty());
    }
}
