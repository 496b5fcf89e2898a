//! Property-based tests for channel bookkeeping

use std::sync::Arc;

use proptest::prelude::*;

use souq_chat::client::realtime::{ChannelClient, Handler, LoopbackTransport};
use souq_chat::shared::event::EventKind;

#[derive(Debug, Clone)]
enum Op {
    Subscribe(usize),
    Unsubscribe(usize),
    Bind(usize),
    Unbind(usize),
}

const CHANNELS: [&str; 3] = ["private-user.1", "private-user.2", "listings"];

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..CHANNELS.len()).prop_map(Op::Subscribe),
        (0..CHANNELS.len()).prop_map(Op::Unsubscribe),
        (0..2usize).prop_map(Op::Bind),
        (0..2usize).prop_map(Op::Unbind),
    ]
}

proptest! {
    #[test]
    fn test_at_most_one_subscription_per_channel(ops in prop::collection::vec(op(), 0..40)) {
        let transport = Arc::new(LoopbackTransport::new());
        let client = ChannelClient::new(transport.clone());
        let handlers = [Handler::new(|_| {}), Handler::new(|_| {})];

        for op in ops {
            match op {
                Op::Subscribe(i) => { client.subscribe(CHANNELS[i]).unwrap(); }
                Op::Unsubscribe(i) => client.unsubscribe(CHANNELS[i]),
                Op::Bind(h) => client.bind(EventKind::NewMessage, handlers[h].clone()),
                Op::Unbind(h) => client.unbind(&EventKind::NewMessage, Some(&handlers[h])),
            }

            let registered = client.handler_count(&EventKind::NewMessage);
            for name in CHANNELS {
                let live = transport.active_subscriptions(name);
                prop_assert!(live <= 1);
                prop_assert_eq!(live == 1, client.is_subscribed(name));
                if live == 1 {
                    // Every registered handler is attached exactly once
                    prop_assert_eq!(transport.bound_count(name, "new-message"), registered);
                }
            }
        }
    }
}
