//! Integration tests for the session authority
//!
//! These tests drive the server through its gateway and over real UDP sockets, and check what
//! client replicas end up seeing.

use assert_approx_eq::assert_approx_eq;
use bincode::{deserialize, serialize};
use client::game::{ClientEvent, ClientGameState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use server::game::{GameState, SessionConfig};
use server::present::{CollectOutcome, SpawnOutcome};
use server::router::Outbound;
use shared::{ListEvent, Packet, PlayerRecord, PresentId, CLIENT_VERSION, PRESENT_VALUES, SESSION_SECS};
use std::time::Duration;

fn seeded_session(seed: u64) -> GameState {
    GameState::with_rng(&SessionConfig::default(), StdRng::seed_from_u64(seed))
}

fn drop_and_land(state: &GameState) -> PresentId {
    let present_id = match state.start() {
        SpawnOutcome::Spawned { present_id, .. } => present_id,
        other => panic!("expected a spawned present, got {:?}", other),
    };
    assert!(state.presents().mark_landed(present_id));
    present_id
}

/// Feeds everything queued for one connection into a client view
fn drain(outbound: &mut Outbound, view: &mut ClientGameState) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Ok(packet) = outbound.try_recv() {
        if let Some(event) = view.apply_packet(packet) {
            events.push(event);
        }
    }
    events
}

/// SESSION FLOW TESTS
mod session_tests {
    use super::*;

    /// Two players join, one names themselves and wins the present, the other chats
    #[test]
    fn replicas_follow_the_ledger() {
        let state = seeded_session(7);
        let mut rx1 = state.gateway().join(1);
        let mut rx2 = state.gateway().join(2);
        let present_id = drop_and_land(&state);

        let gateway = state.gateway();
        gateway.handle_packet(
            1,
            Packet::Chat {
                text: "::playerName Nox".to_string(),
            },
        );
        gateway.handle_packet(
            2,
            Packet::Chat {
                text: "hi all".to_string(),
            },
        );
        gateway.handle_packet(1, Packet::CollectRequest { present_id });
        gateway.handle_packet(2, Packet::CollectRequest { present_id });

        let mut view1 = ClientGameState::new();
        let mut view2 = ClientGameState::new();
        let events1 = drain(&mut rx1, &mut view1);
        let events2 = drain(&mut rx2, &mut view2);

        // Same replica everywhere, matching the authority
        let authority = state.ledger().snapshot();
        assert_eq!(view1.scoreboard(), authority.as_slice());
        assert_eq!(view2.scoreboard(), authority.as_slice());
        assert_eq!(authority.len(), 1);
        assert_eq!(authority[0].display_name, "Nox");

        // Only the owner hears about their score
        let score = view1.score().unwrap();
        assert!(PRESENT_VALUES.contains(&score));
        assert_eq!(authority[0].score, score);
        assert_eq!(view2.score(), None);

        // The greeting is private, the chat line is not
        assert!(events1.contains(&ClientEvent::Chat("Hello Nox!".to_string())));
        assert!(!events2.contains(&ClientEvent::Chat("Hello Nox!".to_string())));
        assert!(events1.contains(&ClientEvent::Chat("player: hi all".to_string())));
        assert!(events2.contains(&ClientEvent::Chat("player: hi all".to_string())));

        // Both see the next present, which has not landed yet
        let next = view1.present().unwrap();
        assert_ne!(next.id, present_id);
        assert!(!next.landed);
        assert_eq!(view2.present().unwrap().id, next.id);
    }

    #[test]
    fn late_joiner_sees_live_present() {
        let state = seeded_session(3);
        let present_id = drop_and_land(&state);

        let mut rx = state.gateway().join(9);
        let mut view = ClientGameState::new();
        let events = drain(&mut rx, &mut view);

        assert_eq!(
            events,
            vec![
                ClientEvent::Connected(9),
                ClientEvent::PresentSpawned(present_id),
                ClientEvent::PresentLanded(present_id),
            ]
        );
    }

    /// A player joining after scores exist starts from the full ledger and keeps up with it
    #[test]
    fn late_joiner_replica_matches_ledger() {
        let state = seeded_session(13);
        let gateway = state.gateway();
        let _rx1 = gateway.join(1);
        gateway.chat(1, "::playerName Nox");
        gateway.score_update_request(1, 10, None);
        gateway.score_update_request(3, 5, Some("Vex"));

        let mut rx2 = gateway.join(2);
        let mut view = ClientGameState::new();
        drain(&mut rx2, &mut view);
        assert_eq!(view.scoreboard(), state.ledger().snapshot().as_slice());

        let steps: [(u64, i32, Option<&str>); 4] = [
            (1, 5, None),
            (2, 20, Some("Zed")),
            (3, -2, None),
            (1, 30, None),
        ];
        for (player_id, points, name) in steps {
            gateway.score_update_request(player_id, points, name);
            drain(&mut rx2, &mut view);
            assert_eq!(view.scoreboard(), state.ledger().snapshot().as_slice());
        }

        assert_eq!(view.scoreboard().len(), 3);
        assert_eq!(view.score(), Some(20));
        let leaders: Vec<u64> = view.leaderboard().iter().map(|r| r.player_id).collect();
        assert_eq!(leaders, vec![1, 2, 3]);
    }

    #[test]
    fn departed_player_receives_nothing() {
        let state = seeded_session(11);
        let mut rx = state.gateway().join(1);
        state.gateway().leave(1);

        let present_id = drop_and_land(&state);
        state.gateway().collect_request(2, present_id);

        let mut view = ClientGameState::new();
        let events = drain(&mut rx, &mut view);
        assert_eq!(events, vec![ClientEvent::Connected(1)]);
        assert_eq!(state.ledger().record(2).map(|r| r.player_id), Some(2));
    }

    #[test]
    fn clock_ticks_reach_every_player() {
        let mut state = seeded_session(2);
        let mut rx = state.gateway().join(1);

        state.update_physics(0.5);
        state.update_physics(0.6);
        assert_approx_eq!(state.clock().remaining(), SESSION_SECS - 1.1, 0.001);

        let mut view = ClientGameState::new();
        let events = drain(&mut rx, &mut view);
        assert!(events.contains(&ClientEvent::Timer(SESSION_SECS as u32 - 1)));
        assert_eq!(view.remaining_secs(), Some(SESSION_SECS as u32 - 1));
    }

    #[test]
    fn ending_the_session_clears_replicas() {
        let state = seeded_session(5);
        let mut rx = state.gateway().join(1);
        state.gateway().score_update_request(1, 40, Some("Vex"));
        state.end();

        let mut view = ClientGameState::new();
        drain(&mut rx, &mut view);
        assert!(view.scoreboard().is_empty());
        assert!(state.ledger().is_empty());
        // the last notice stands even though the ledger was cleared
        assert_eq!(view.score(), Some(40));
    }
}

/// CONCURRENCY TESTS
mod concurrency_tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    /// Many players grab the same landed present at once; exactly one is paid
    #[test]
    fn simultaneous_collects_award_once() {
        for seed in 0..10 {
            let state = seeded_session(seed);
            let present_id = drop_and_land(&state);
            let barrier = Barrier::new(12);

            let outcomes: Vec<CollectOutcome> = thread::scope(|scope| {
                let handles: Vec<_> = (1..=12u64)
                    .map(|player_id| {
                        let gateway = state.gateway();
                        let barrier = &barrier;
                        scope.spawn(move || {
                            barrier.wait();
                            gateway.collect_request(player_id, present_id)
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            let winners = outcomes
                .iter()
                .filter(|o| matches!(o, CollectOutcome::Awarded { .. }))
                .count();
            assert_eq!(winners, 1, "seed {}", seed);

            let records: Vec<PlayerRecord> = state.ledger().snapshot();
            assert_eq!(records.len(), 1);
            assert!(PRESENT_VALUES.contains(&records[0].score));
        }
    }

    #[test]
    fn concurrent_awards_are_not_lost() {
        let state = seeded_session(1);
        thread::scope(|scope| {
            for player_id in 1..=4u64 {
                let gateway = state.gateway();
                scope.spawn(move || {
                    for _ in 0..250 {
                        gateway.score_update_request(player_id, 2, None);
                    }
                });
            }
        });

        let records = state.ledger().snapshot();
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.score == 500));
    }
}

/// NETWORK TESTS
mod network_tests {
    use super::*;
    use server::network::{Server, ServerMessage};
    use tokio::net::UdpSocket;
    use tokio::time::{timeout, Instant};

    use std::net::SocketAddr;
    use tokio::sync::mpsc::UnboundedSender;
    use tokio::task::JoinHandle;

    type Running = (SocketAddr, UnboundedSender<ServerMessage>, JoinHandle<()>);

    async fn start_server(config: SessionConfig) -> Running {
        let mut server = Server::new("127.0.0.1:0", Duration::from_millis(16), config)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let control = server.control();
        let handle = tokio::spawn(async move {
            server.run().await.unwrap();
        });
        (addr, control, handle)
    }

    async fn send(socket: &UdpSocket, addr: SocketAddr, packet: &Packet) {
        socket.send_to(&serialize(packet).unwrap(), addr).await.unwrap();
    }

    /// Receives until `matches` accepts a packet or two seconds pass
    async fn recv_until<F>(socket: &UdpSocket, mut matches: F) -> Option<Packet>
    where
        F: FnMut(&Packet) -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut buffer = [0u8; 2048];
        loop {
            let left = deadline.checked_duration_since(Instant::now())?;
            let (len, _) = timeout(left, socket.recv_from(&mut buffer)).await.ok()?.ok()?;
            if let Ok(packet) = deserialize::<Packet>(&buffer[..len]) {
                if matches(&packet) {
                    return Some(packet);
                }
            }
        }
    }

    async fn connect(socket: &UdpSocket, addr: SocketAddr) -> u64 {
        send(
            socket,
            addr,
            &Packet::Connect {
                client_version: CLIENT_VERSION,
            },
        )
        .await;
        match recv_until(socket, |p| matches!(p, Packet::Connected { .. })).await {
            Some(Packet::Connected { client_id }) => client_id,
            other => panic!("expected Connected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn naming_over_udp() {
        let (addr, control, handle) = start_server(SessionConfig::default()).await;
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let client_id = connect(&socket, addr).await;
        send(
            &socket,
            addr,
            &Packet::Chat {
                text: "::playerName Nox".to_string(),
            },
        )
        .await;

        let added = recv_until(&socket, |p| {
            matches!(
                p,
                Packet::LedgerSync {
                    event: ListEvent::Add { .. }
                }
            )
        })
        .await;
        assert_eq!(
            added,
            Some(Packet::LedgerSync {
                event: ListEvent::Add {
                    item: PlayerRecord::new(client_id, "Nox", 0)
                }
            })
        );

        let notice = recv_until(&socket, |p| matches!(p, Packet::ScoreNotice { .. })).await;
        assert_eq!(
            notice,
            Some(Packet::ScoreNotice {
                player_id: client_id,
                score: 0
            })
        );

        // Shutting down ends the session, which clears every replica
        control.send(ServerMessage::Shutdown).unwrap();
        timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
        let cleared = recv_until(&socket, |p| {
            matches!(
                p,
                Packet::LedgerSync {
                    event: ListEvent::Clear
                }
            )
        })
        .await;
        assert!(cleared.is_some());
        let goodbye = recv_until(&socket, |p| matches!(p, Packet::Disconnected { .. })).await;
        assert_eq!(
            goodbye,
            Some(Packet::Disconnected {
                reason: "Server shutting down".to_string()
            })
        );
    }

    #[tokio::test]
    async fn version_mismatch_and_full_server_are_rejected() {
        let config = SessionConfig {
            max_clients: 1,
            ..SessionConfig::default()
        };
        let (addr, control, handle) = start_server(config).await;

        let old = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        send(&old, addr, &Packet::Connect { client_version: 99 }).await;
        let rejected = recv_until(&old, |p| matches!(p, Packet::Disconnected { .. })).await;
        assert_eq!(
            rejected,
            Some(Packet::Disconnected {
                reason: "Protocol version mismatch".to_string()
            })
        );

        let first = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        connect(&first, addr).await;

        let second = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        send(
            &second,
            addr,
            &Packet::Connect {
                client_version: CLIENT_VERSION,
            },
        )
        .await;
        let rejected = recv_until(&second, |p| matches!(p, Packet::Disconnected { .. })).await;
        assert_eq!(
            rejected,
            Some(Packet::Disconnected {
                reason: "Server full".to_string()
            })
        );

        control.send(ServerMessage::Shutdown).unwrap();
        timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
    }

    /// Garbage on the wire is dropped and the server keeps serving
    #[tokio::test]
    async fn malformed_packet_handling() {
        let (addr, control, handle) = start_server(SessionConfig::default()).await;
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let valid = serialize(&Packet::Connect {
            client_version: CLIENT_VERSION,
        })
        .unwrap();
        socket.send_to(&[0xFF; 7], addr).await.unwrap();
        socket.send_to(&valid[..valid.len() / 2], addr).await.unwrap();
        socket.send_to(&[], addr).await.unwrap();

        let truncated: Result<Packet, _> = deserialize(&valid[..valid.len() / 2]);
        assert!(truncated.is_err());

        connect(&socket, addr).await;

        control.send(ServerMessage::Shutdown).unwrap();
        timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
    }
}
