mod common;

use async_trait::async_trait;
use common::{Chain, FakeSource, Wallet};
use river_kernel::codec::{unpack_miniblock, UnpackOpts};
use river_kernel::notify::EncryptedContentKind;
use river_kernel::{DecryptedContent, DecryptionSessionError};
use river_model::StreamId;
use river_proto::{ChannelMessage, EncryptedData};
use river_sync::{
    entitled_key_exchange_users, EntitlementChecker, GroupDecryptor, Permission, ScrollbackCoordinator,
    StreamReader, SyncError,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// Channel with snapshots at blocks 0, 8 and 10; alice joins in block 1.
fn long_chain(alice: &Wallet) -> Chain {
    let mut chain = Chain::channel();
    chain.seal(vec![alice.join()]);
    for i in 2..8 {
        chain.seal(vec![alice.message(&format!("m{}", i))]);
    }
    chain.seal_snapshot(vec![]);
    chain.seal(vec![alice.message("m9")]);
    chain.seal_snapshot(vec![]);
    chain.seal(vec![alice.message("latest")]);
    chain
}

fn setup(chain: Chain, first: usize) -> (Arc<FakeSource>, Arc<StreamReader>, ScrollbackCoordinator) {
    let source = Arc::new(FakeSource::new(chain, first));
    let reader = Arc::new(StreamReader::new(source.clone(), "reader"));
    let coordinator = ScrollbackCoordinator::new(reader.clone());
    (source, reader, coordinator)
}

#[tokio::test]
async fn test_get_stream_bootstraps_view() {
    let alice = Wallet::random();
    let (source, reader, _) = setup(long_chain(&alice), 10);
    let stream_id = source.chain.stream_id;

    let handle = reader.get_stream(&stream_id).await.unwrap();
    let info = handle.miniblock_info().await.unwrap().unwrap();
    assert_eq!((info.min, info.max, info.terminus_reached), (10, 11, false));
    assert_eq!(handle.read(|v| v.prev_snapshot_miniblock_num()).await.unwrap(), 8);

    assert!(reader.get_stream(&StreamId::random(river_model::StreamKind::Channel)).await.is_err());
}

#[tokio::test]
async fn test_empty_range_needs_no_fetch() {
    let alice = Wallet::random();
    let (source, reader, _) = setup(long_chain(&alice), 10);
    let stream_id = source.chain.stream_id;

    let page = reader.get_miniblocks(&stream_id, 0, 0).await.unwrap();
    assert!(page.miniblocks.is_empty());
    assert!(page.terminus);

    let page = reader.get_miniblocks(&stream_id, 5, 5).await.unwrap();
    assert!(page.miniblocks.is_empty());
    assert!(!page.terminus);
    assert_eq!(source.miniblock_calls(), 0);
}

#[tokio::test]
async fn test_scrollback_window_grows_to_terminus() {
    let alice = Wallet::random();
    let (source, reader, coordinator) = setup(long_chain(&alice), 10);
    let handle = reader.get_stream(&source.chain.stream_id).await.unwrap();

    // [2, 10): span 10 - 8 = 2, times 4.
    let first = coordinator.scrollback(&handle).await.unwrap();
    assert!(!first.terminus);
    assert_eq!(handle.miniblock_info().await.unwrap().unwrap().min, 2);

    let second = coordinator.scrollback(&handle).await.unwrap();
    assert!(second.terminus);
    let info = handle.miniblock_info().await.unwrap().unwrap();
    assert_eq!((info.min, info.terminus_reached), (0, true));
    assert_eq!(second.first_event.map(|e| e.event_num), Some(0));
    assert_eq!(source.miniblock_calls(), 2);

    // Alice's join from block 1 was backfilled.
    let alice_id = alice.user_id();
    let joined = handle.read(move |v| v.get_members().is_member_joined(&alice_id)).await.unwrap();
    assert!(joined);
}

#[tokio::test]
async fn test_no_fetch_after_terminus() {
    let alice = Wallet::random();
    let (source, reader, coordinator) = setup(long_chain(&alice), 10);
    let handle = reader.get_stream(&source.chain.stream_id).await.unwrap();

    coordinator.scrollback_to_date(&handle, 0).await.unwrap();
    let calls = source.miniblock_calls();
    assert!(handle.miniblock_info().await.unwrap().unwrap().terminus_reached);

    coordinator.scrollback_to_date(&handle, 0).await.unwrap();
    let result = coordinator.scrollback(&handle).await.unwrap();
    assert!(result.terminus);
    assert_eq!(source.miniblock_calls(), calls);
}

#[tokio::test]
async fn test_scrollback_to_date_stops_at_bound() {
    let alice = Wallet::random();
    let (source, reader, coordinator) = setup(long_chain(&alice), 10);
    let handle = reader.get_stream(&source.chain.stream_id).await.unwrap();

    // Every event is older than this bound, so one page is enough.
    coordinator.scrollback_to_date(&handle, i64::MAX).await.unwrap();
    assert_eq!(source.miniblock_calls(), 1);
    assert!(!handle.miniblock_info().await.unwrap().unwrap().terminus_reached);
}

#[tokio::test]
async fn test_concurrent_scrollbacks_share_one_fetch() {
    let alice = Wallet::random();
    let (source, reader, coordinator) = setup(long_chain(&alice), 10);
    let handle = reader.get_stream(&source.chain.stream_id).await.unwrap();

    let (a, b) = tokio::join!(coordinator.scrollback(&handle), coordinator.scrollback(&handle));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(source.miniblock_calls(), 1);
    assert_eq!(a.terminus, b.terminus);
    assert_eq!(a.first_event.map(|e| e.hash_str), b.first_event.map(|e| e.hash_str));
    assert_eq!(coordinator.pending_count().await, 0);
}

#[tokio::test]
async fn test_failed_scrollback_is_not_cached() {
    let alice = Wallet::random();
    let (source, reader, coordinator) = setup(long_chain(&alice), 10);
    let handle = reader.get_stream(&source.chain.stream_id).await.unwrap();
    source.fail_miniblocks.store(true, Ordering::SeqCst);

    let (a, b) = tokio::join!(coordinator.scrollback(&handle), coordinator.scrollback(&handle));
    for result in [a, b] {
        match result {
            Err(SyncError::Shared(inner)) => assert!(matches!(*inner, SyncError::StreamNotFound(_))),
            other => panic!("expected shared failure, got {:?}", other.map(|r| r.terminus)),
        }
    }
    assert_eq!(source.miniblock_calls(), 1);
    assert_eq!(coordinator.pending_count().await, 0);
    assert_eq!(handle.miniblock_info().await.unwrap().unwrap().min, 10);

    // The next call fetches again instead of replaying the failure.
    source.fail_miniblocks.store(false, Ordering::SeqCst);
    coordinator.scrollback(&handle).await.unwrap();
    assert_eq!(source.miniblock_calls(), 2);
    assert_eq!(handle.miniblock_info().await.unwrap().unwrap().min, 2);
}

#[tokio::test]
async fn test_page_discarded_when_range_moved() {
    let alice = Wallet::random();
    let (source, reader, coordinator) = setup(long_chain(&alice), 10);
    let handle = reader.get_stream(&source.chain.stream_id).await.unwrap();

    // Block 9 lands while the [2, 10) page is in flight.
    let block_9 = unpack_miniblock(&source.chain.blocks[9], &UnpackOpts::unchecked()).unwrap();
    *source.interfere.lock().await = Some((handle.clone(), vec![block_9]));

    let result = coordinator.scrollback(&handle).await.unwrap();
    assert!(!result.terminus);
    assert_eq!(source.miniblock_calls(), 1);

    let info = handle.miniblock_info().await.unwrap().unwrap();
    assert_eq!(info.min, 9);
    let block_2_header = hex_of(&source.chain.blocks[2]);
    assert!(!handle.read(move |v| v.timeline().contains(&block_2_header)).await.unwrap());

    // The next call pages from the moved range: [9 - (9 - 8) * 4, 9).
    coordinator.scrollback(&handle).await.unwrap();
    assert_eq!(handle.miniblock_info().await.unwrap().unwrap().min, 5);
}

fn hex_of(block: &river_proto::Miniblock) -> String {
    block.header.as_ref().map(|h| hex::encode(&h.hash)).unwrap_or_default()
}

struct DenyUser(String);

#[async_trait]
impl EntitlementChecker for DenyUser {
    async fn is_entitled(
        &self,
        space_id: Option<&StreamId>,
        channel_id: Option<&StreamId>,
        user_id: &str,
        permission: Permission,
    ) -> bool {
        assert!(space_id.is_some() && channel_id.is_some());
        assert_eq!(permission, Permission::Read);
        user_id != self.0
    }
}

#[tokio::test]
async fn test_key_exchange_users_filtered_by_entitlement() {
    let alice = Wallet::random();
    let bob = Wallet::random();
    let mut chain = Chain::channel();
    chain.seal(vec![alice.join(), bob.join()]);
    let (source, reader, _) = setup(chain, 0);
    let handle = reader.get_stream(&source.chain.stream_id).await.unwrap();

    let users = entitled_key_exchange_users(&handle, &DenyUser(bob.user_id())).await.unwrap();
    assert_eq!(users.into_iter().collect::<Vec<_>>(), vec![alice.user_id()]);
}

struct EchoDecryptor;

#[async_trait]
impl GroupDecryptor for EchoDecryptor {
    async fn decrypt(
        &self,
        _stream_id: &StreamId,
        kind: EncryptedContentKind,
        content: &EncryptedData,
    ) -> Result<DecryptedContent, DecryptionSessionError> {
        match (kind, content.ciphertext.as_str()) {
            (_, "locked") => Err(DecryptionSessionError {
                missing_session: true,
                kind: "channelMessage".into(),
                message: "no session".into(),
            }),
            (EncryptedContentKind::ChannelMessage, text) => {
                Ok(DecryptedContent::ChannelMessage(ChannelMessage::text(text)))
            }
            (_, text) => Ok(DecryptedContent::Text(text.to_string())),
        }
    }
}

#[tokio::test]
async fn test_loaded_messages_are_decrypted() {
    let alice = Wallet::random();
    let mut chain = Chain::channel();
    let open = alice.message("hello");
    let locked = alice.message("locked");
    chain.seal(vec![alice.join(), open.clone(), locked.clone()]);
    let source = Arc::new(FakeSource::new(chain, 0));
    let reader = StreamReader::new(source.clone(), "reader").with_decryptor(Arc::new(EchoDecryptor));
    let handle = reader.get_stream(&source.chain.stream_id).await.unwrap();

    let open_id = hex::encode(&open.hash);
    let locked_id = hex::encode(&locked.hash);
    let settled = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let (open_id, locked_id) = (open_id.clone(), locked_id.clone());
            let done = handle
                .read(move |v| {
                    let open = v.timeline().get(&open_id).map(|e| e.decrypted_content.is_some());
                    let locked = v.timeline().get(&locked_id).map(|e| e.decrypted_content_error.is_some());
                    open == Some(true) && locked == Some(true)
                })
                .await
                .unwrap();
            if done {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(settled.is_ok());
}
