//! Registry tests — membership, snapshots, and concurrent mutation.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use relay_core::{ClientHandle, ClientRegistry};
    use relay_protocol::{ClientId, Envelope};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn client() -> (ClientHandle, UnboundedReceiver<Envelope>) {
        ClientHandle::channel(ClientId::new())
    }

    // ─────────────────────────────────────────────────────────────────────
    // register / unregister
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn register_greets_the_new_client() {
        let registry = ClientRegistry::new();
        let (handle, mut rx) = client();
        let id = handle.id();

        registry.register(handle);

        match rx.try_recv().unwrap() {
            Envelope::Welcome {
                client_id, clients, ..
            } => {
                assert_eq!(client_id, id);
                assert_eq!(clients, 1);
            }
            other => panic!("expected welcome, got {other:?}"),
        }
    }

    #[test]
    fn welcome_reports_membership_after_insert() {
        let registry = ClientRegistry::new();
        for expected in 1..=3usize {
            let (handle, mut rx) = client();
            registry.register(handle);
            match rx.try_recv().unwrap() {
                Envelope::Welcome { clients, .. } => assert_eq!(clients, expected),
                other => panic!("expected welcome, got {other:?}"),
            }
        }
    }

    #[test]
    fn register_with_dead_receiver_still_adds_membership() {
        let registry = ClientRegistry::new();
        let (handle, rx) = client();
        let id = handle.id();
        drop(rx);

        registry.register(handle);
        assert!(registry.contains(id));
    }

    #[test]
    fn unregister_removes_membership() {
        let registry = ClientRegistry::new();
        let (handle, _rx) = client();
        let id = handle.id();

        registry.register(handle);
        assert!(registry.contains(id));

        registry.unregister(id);
        assert!(!registry.contains(id));
        assert_eq!(registry.size(), 0);
    }

    #[test]
    fn unregister_absent_id_is_a_noop() {
        let registry = ClientRegistry::new();
        registry.unregister(ClientId::new());
        assert_eq!(registry.size(), 0);
    }

    #[test]
    fn unregister_twice_is_safe() {
        let registry = ClientRegistry::new();
        let (handle, _rx) = client();
        let id = handle.id();
        registry.register(handle);

        registry.unregister(id);
        registry.unregister(id);
        assert_eq!(registry.size(), 0);
    }

    // ─────────────────────────────────────────────────────────────────────
    // snapshot
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn snapshot_excludes_the_given_client() {
        let registry = ClientRegistry::new();
        let (a, _ra) = client();
        let (b, _rb) = client();
        let (c, _rc) = client();
        let a_id = a.id();
        registry.register(a);
        registry.register(b);
        registry.register(c);

        let snap = registry.snapshot(Some(a_id));
        assert_eq!(snap.len(), 2);
        assert!(snap.iter().all(|h| h.id() != a_id));
    }

    #[test]
    fn snapshot_without_exclusion_includes_everyone() {
        let registry = ClientRegistry::new();
        let (a, _ra) = client();
        let (b, _rb) = client();
        registry.register(a);
        registry.register(b);

        assert_eq!(registry.snapshot(None).len(), 2);
    }

    #[test]
    fn snapshot_is_stable_under_later_mutation() {
        let registry = ClientRegistry::new();
        let (a, _ra) = client();
        let (b, _rb) = client();
        let b_id = b.id();
        registry.register(a);
        registry.register(b);

        let snap = registry.snapshot(None);
        registry.unregister(b_id);

        // The copy taken before the removal is unaffected.
        assert_eq!(snap.len(), 2);
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn snapshot_never_contains_a_removed_client() {
        let registry = ClientRegistry::new();
        let (a, _ra) = client();
        let (b, _rb) = client();
        let b_id = b.id();
        registry.register(a);
        registry.register(b);
        registry.unregister(b_id);

        let snap = registry.snapshot(None);
        assert!(snap.iter().all(|h| h.id() != b_id));
    }

    // ─────────────────────────────────────────────────────────────────────
    // drain
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn drain_removes_and_returns_every_member() {
        let registry = ClientRegistry::new();
        let (a, _ra) = client();
        let (b, _rb) = client();
        registry.register(a);
        registry.register(b);

        let drained = registry.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(registry.size(), 0);
    }

    #[test]
    fn drain_empty_registry_returns_nothing() {
        let registry = ClientRegistry::new();
        assert!(registry.drain().is_empty());
    }

    // ─────────────────────────────────────────────────────────────────────
    // concurrency
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn concurrent_mutation_loses_no_updates() {
        let registry = Arc::new(ClientRegistry::new());

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let mut kept = Vec::new();
                    for i in 0..50 {
                        let (handle, _rx) = ClientHandle::channel(ClientId::new());
                        let id = handle.id();
                        registry.register(handle);
                        if i % 2 == 0 {
                            registry.unregister(id);
                        } else {
                            kept.push(id);
                        }
                    }
                    kept
                })
            })
            .collect();

        let expected: HashSet<ClientId> = workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect();

        let members: HashSet<ClientId> = registry
            .snapshot(None)
            .into_iter()
            .map(|h| h.id())
            .collect();

        // Exactly the registered-and-not-unregistered set survives:
        // no lost updates, no duplicates, no stragglers.
        assert_eq!(members, expected);
        assert_eq!(registry.size(), expected.len());
    }
}
