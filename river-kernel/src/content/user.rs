use super::{stream_id_of, unexpected_payload, unexpected_snapshot, ContentProjection};
use crate::error::RiverError;
use crate::notify::{Notifier, StreamStateEvent};
use crate::timeline::StreamTimelineEvent;
use river_model::{StreamId, StreamKind};
use river_proto::user_payload::{self, UserMembership};
use river_proto::{snapshot, stream_event, MembershipOp, Snapshot};
use std::collections::HashMap;

/// A user's own stream: which streams they were invited to, joined or left.
#[derive(Debug, Clone)]
pub struct UserContent {
    pub stream_id: StreamId,
    pub stream_memberships: HashMap<StreamId, UserMembership>,
}

impl UserContent {
    pub fn new(stream_id: StreamId) -> Self {
        Self { stream_id, stream_memberships: HashMap::new() }
    }

    pub fn membership_op(&self, stream_id: &StreamId) -> MembershipOp {
        self.stream_memberships
            .get(stream_id)
            .and_then(|m| MembershipOp::try_from(m.op).ok())
            .unwrap_or(MembershipOp::SoUnspecified)
    }

    pub fn is_member(&self, stream_id: &StreamId, op: MembershipOp) -> bool {
        self.membership_op(stream_id) == op
    }

    pub fn is_joined(&self, stream_id: &StreamId) -> bool {
        self.is_member(stream_id, MembershipOp::SoJoin)
    }

    fn add_membership(&mut self, membership: &UserMembership, notifier: &Notifier) -> Result<(), RiverError> {
        let target = stream_id_of(&membership.stream_id)?;
        let op = MembershipOp::try_from(membership.op).unwrap_or(MembershipOp::SoUnspecified);
        self.stream_memberships.insert(target, membership.clone());

        let stream_id = self.stream_id;
        match op {
            MembershipOp::SoInvite => {
                notifier.state(StreamStateEvent::UserInvitedToStream { stream_id, target_stream_id: target });
            }
            MembershipOp::SoJoin => {
                notifier.state(StreamStateEvent::UserJoinedStream { stream_id, target_stream_id: target });
            }
            MembershipOp::SoLeave => {
                notifier.state(StreamStateEvent::UserLeftStream { stream_id, target_stream_id: target });
            }
            MembershipOp::SoUnspecified => {}
        }
        notifier.state(StreamStateEvent::UserStreamMembershipChanged { stream_id, target_stream_id: target, op });
        Ok(())
    }
}

impl ContentProjection for UserContent {
    fn apply_snapshot(&mut self, _event_id: &str, snapshot: &Snapshot, _notifier: &Notifier) -> Result<(), RiverError> {
        let Some(snapshot::Content::UserContent(content)) = &snapshot.content else {
            return Err(unexpected_snapshot(StreamKind::User));
        };
        for membership in &content.memberships {
            self.stream_memberships.insert(stream_id_of(&membership.stream_id)?, membership.clone());
        }
        Ok(())
    }

    fn append_event(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError> {
        let Some(stream_event::Payload::UserPayload(payload)) = event.payload() else {
            return Err(unexpected_payload(StreamKind::User, event));
        };
        match &payload.content {
            Some(user_payload::Content::UserMembership(membership)) => self.add_membership(membership, notifier),
            // Actions are requests for the node; the resulting membership follows.
            Some(user_payload::Content::UserMembershipAction(_)) => Ok(()),
            Some(user_payload::Content::Inception(_)) | None => Ok(()),
        }
    }

    fn prepend_event(&mut self, event: &StreamTimelineEvent, _notifier: &Notifier) -> Result<(), RiverError> {
        match event.payload() {
            Some(stream_event::Payload::UserPayload(_)) => Ok(()),
            _ => Err(unexpected_payload(StreamKind::User, event)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_tracks_latest_op() {
        let notifier = Notifier::new(16);
        let mut rx = notifier.subscribe_state();
        let mut user = UserContent::new(StreamId::random(StreamKind::User));
        let channel = StreamId::random(StreamKind::Channel);

        let join = UserMembership { stream_id: channel.to_vec(), op: MembershipOp::SoJoin as i32, ..Default::default() };
        user.add_membership(&join, &notifier).unwrap();
        assert!(user.is_joined(&channel));
        assert!(matches!(rx.try_recv(), Ok(StreamStateEvent::UserJoinedStream { .. })));

        let leave = UserMembership { op: MembershipOp::SoLeave as i32, ..join };
        user.add_membership(&leave, &notifier).unwrap();
        assert!(user.is_member(&channel, MembershipOp::SoLeave));
    }
}
