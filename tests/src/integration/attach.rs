//! # Snapshot Attachment End to End
//!
//! A wallet-style observer attaches to a node that is already streaming
//! events. The attachment contract: the subscriber sees every mempool
//! transaction exactly once, snapshot transactions via replay and later
//! transactions live, with no gap and no duplicate at the boundary,
//! even while producers keep notifying throughout the attach.
//!
//! ## Properties Tested:
//!
//! 1. **Exactly once**: mid-stream attach loses and duplicates nothing
//! 2. **Disconnect**: the handle stops live delivery, eagerly or on drop
//! 3. **Tip sync**: `sync_if_tip_changed` flushes only when the tip moved

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use chain_client::{attach_notifications, sync_if_tip_changed, ChainView, MempoolView};
    use chain_notify::{ChainNotifier, ChainSubscriber};
    use chain_types::{Block, BlockHeader, BlockPosition, Transaction};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn sample_tx(nonce: u64) -> Arc<Transaction> {
        Arc::new(Transaction {
            from: [0xAA; 32],
            to: Some([0xBB; 32]),
            value: 1_000,
            nonce,
            data: vec![],
            signature: [0x11; 64],
        })
    }

    fn block_at(height: u64) -> (Arc<Block>, BlockPosition) {
        let block = Block {
            header: BlockHeader {
                version: 1,
                height,
                parent_hash: [0; 32],
                merkle_root: [0; 32],
                timestamp: 1_700_000_000 + height,
            },
            transactions: vec![],
        };
        let position = BlockPosition::of(&block.header);
        (Arc::new(block), position)
    }

    /// Node stand-in: a mempool and the hub, mutated under one lock so
    /// snapshots and notifications stay consistent.
    struct TestNode {
        mempool: Mutex<Vec<Arc<Transaction>>>,
        notifier: ChainNotifier,
    }

    /// Mempool view over contents frozen by the caller's lock.
    struct FrozenMempool {
        txs: Vec<Arc<Transaction>>,
    }

    impl MempoolView for FrozenMempool {
        fn snapshot(&self) -> Vec<Arc<Transaction>> {
            self.txs.clone()
        }
    }

    /// Chain stand-in with a movable tip.
    struct TestChain {
        tip: Mutex<Option<BlockPosition>>,
    }

    impl ChainView for TestChain {
        fn tip(&self) -> Option<BlockPosition> {
            *self.tip.lock()
        }
    }

    /// Wallet stand-in recording received transaction nonces.
    #[derive(Default)]
    struct NonceTap {
        seen: Mutex<Vec<u64>>,
    }

    impl NonceTap {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn entries(&self) -> Vec<u64> {
            self.seen.lock().clone()
        }
    }

    #[async_trait]
    impl ChainSubscriber for NonceTap {
        async fn on_transaction_added(&self, tx: Arc<Transaction>) {
            self.seen.lock().push(tx.nonce);
        }
    }

    /// Recorder for block and tip events.
    #[derive(Default)]
    struct ChainRecorder {
        seen: Mutex<Vec<String>>,
    }

    impl ChainRecorder {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn entries(&self) -> Vec<String> {
            self.seen.lock().clone()
        }
    }

    #[async_trait]
    impl ChainSubscriber for ChainRecorder {
        async fn on_block_connected(&self, _block: Arc<Block>, position: BlockPosition) {
            self.seen
                .lock()
                .push(format!("block_connected:{}", position.height));
        }

        async fn on_chain_tip_updated(
            &self,
            new_tip: BlockPosition,
            _fork_point: Option<BlockPosition>,
            _initial_download: bool,
        ) {
            self.seen
                .lock()
                .push(format!("tip_updated:{}", new_tip.height));
        }
    }

    // =============================================================================
    // INTEGRATION TESTS: MID-STREAM ATTACH
    // =============================================================================

    /// Test that a wallet attaching while a producer streams
    /// transactions sees all of them exactly once and in order:
    /// snapshot transactions replayed first, live transactions after.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_mid_stream_attach_delivers_exactly_once() {
        const TOTAL: u64 = 300;

        let node = Arc::new(TestNode {
            mempool: Mutex::new(Vec::new()),
            notifier: ChainNotifier::new(),
        });

        let producer_node = Arc::clone(&node);
        let producer = tokio::spawn(async move {
            for nonce in 0..TOTAL {
                let tx = sample_tx(nonce);
                {
                    let mut pool = producer_node.mempool.lock();
                    pool.push(Arc::clone(&tx));
                    producer_node.notifier.notify_transaction_added(tx);
                }
                if nonce % 32 == 0 {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        });

        // Attach mid-stream. The mempool lock spans snapshot and
        // registration submit, so no transaction can slip between them.
        tokio::time::sleep(Duration::from_millis(4)).await;
        let wallet = NonceTap::new();
        let handle = {
            let pool = node.mempool.lock();
            let view = FrozenMempool {
                txs: (*pool).clone(),
            };
            attach_notifications(
                &node.notifier,
                &view,
                Arc::clone(&wallet) as Arc<dyn ChainSubscriber>,
            )
            .expect("attach should succeed")
        };

        producer.await.expect("producer task panicked");
        timeout(Duration::from_secs(10), node.notifier.flush())
            .await
            .expect("timeout waiting for flush");

        // Every transaction exactly once, in mempool order: the ones
        // from the snapshot replay plus the ones that arrived live.
        assert_eq!(wallet.entries(), (0..TOTAL).collect::<Vec<u64>>());

        drop(handle);
        timeout(Duration::from_secs(5), node.notifier.flush())
            .await
            .expect("timeout waiting for disconnect flush");
        assert_eq!(node.notifier.subscriber_count(), 0);
    }

    /// Test that disconnecting the handle stops live delivery, and that
    /// dropping it behaves the same.
    #[tokio::test]
    async fn test_disconnect_and_drop_stop_live_delivery() {
        let notifier = ChainNotifier::new();
        let view = FrozenMempool {
            txs: vec![sample_tx(1), sample_tx(2)],
        };

        let eager = NonceTap::new();
        let mut eager_handle = attach_notifications(
            &notifier,
            &view,
            Arc::clone(&eager) as Arc<dyn ChainSubscriber>,
        )
        .expect("attach should succeed");

        let dropped = NonceTap::new();
        let dropped_handle = attach_notifications(
            &notifier,
            &view,
            Arc::clone(&dropped) as Arc<dyn ChainSubscriber>,
        )
        .expect("attach should succeed");

        notifier.flush().await;
        assert_eq!(eager.entries(), vec![1, 2]);
        assert_eq!(dropped.entries(), vec![1, 2]);

        eager_handle.disconnect();
        drop(dropped_handle);

        notifier.notify_transaction_added(sample_tx(3));
        notifier.flush().await;

        assert_eq!(eager.entries(), vec![1, 2]);
        assert_eq!(dropped.entries(), vec![1, 2]);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    // =============================================================================
    // INTEGRATION TESTS: TIP SYNC
    // =============================================================================

    /// Test that a reader who just looked at the tip can wait for the
    /// matching notifications, and skips the wait when nothing moved.
    #[tokio::test]
    async fn test_tip_sync_flushes_only_when_tip_moved() {
        let notifier = ChainNotifier::new();
        let chain = TestChain {
            tip: Mutex::new(None),
        };
        let recorder = ChainRecorder::new();
        notifier.register_subscriber(Arc::clone(&recorder) as Arc<dyn ChainSubscriber>);

        // Three blocks connect while the reader is away.
        for height in 1..=3 {
            let (block, position) = block_at(height);
            *chain.tip.lock() = Some(position);
            notifier.notify_block_connected(block, position);
            notifier.notify_chain_tip_updated(position, None, false);
        }
        assert_eq!(notifier.pending_callbacks(), 6);

        // No known tip yet: the reader must flush and see everything.
        sync_if_tip_changed(&notifier, &chain, None).await;
        assert_eq!(notifier.pending_callbacks(), 0);
        assert_eq!(recorder.entries().len(), 6);
        let last_seen = chain.tip().map(|p| p.hash);

        // Unchanged tip: unrelated backlog must not be flushed.
        notifier.notify_transaction_added(sample_tx(99));
        sync_if_tip_changed(&notifier, &chain, last_seen).await;
        assert_eq!(notifier.pending_callbacks(), 1);

        // A fourth block moves the tip: the stale hash forces a flush.
        let (block, position) = block_at(4);
        *chain.tip.lock() = Some(position);
        notifier.notify_block_connected(block, position);
        notifier.notify_chain_tip_updated(position, None, false);

        sync_if_tip_changed(&notifier, &chain, last_seen).await;
        assert_eq!(notifier.pending_callbacks(), 0);
        assert!(recorder
            .entries()
            .contains(&"tip_updated:4".to_string()));
    }
}
