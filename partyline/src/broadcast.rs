//! Audience rules: which sessions receive which derived events. Delivery
//! goes through [SessionLink::deliver] and is fire-and-forget.

use crate::conversation::{ConversationLog, Message};
use crate::session::{SessionLink, SessionRegistry};
use crate::wire::{Role, ServerEvent};

/// A decoded digit goes to admins and newcomers. The locals' physical phone
/// is where the digit was dialed; echoing it back there is pointless.
pub fn dialed_digit<L: SessionLink>(registry: &SessionRegistry<L>, digit: u8) {
    let event = ServerEvent::Dial { digit };
    for (_, session) in registry.iter() {
        if matches!(session.role(), Some(Role::Admin) | Some(Role::Newcomer)) {
            session.link().deliver(event.clone());
        }
    }
}

/// Hook state goes to everyone — anyone on the line sees the handset move.
pub fn handset_changed<L: SessionLink>(registry: &SessionRegistry<L>, is_up: bool) {
    let event = ServerEvent::Receiver { is_up };
    for (_, session) in registry.iter() {
        session.link().deliver(event.clone());
    }
}

/// A chat message goes to everyone except its sender.
pub fn message<L: SessionLink>(registry: &SessionRegistry<L>, origin: &str, message: &Message) {
    let event = ServerEvent::ReceiveMessage {
        message: message.clone(),
    };
    for (id, session) in registry.iter() {
        if id != origin {
            session.link().deliver(event.clone());
        }
    }
}

/// The full conversation goes to everyone, on connect and after a reset.
pub fn snapshot<L: SessionLink>(registry: &SessionRegistry<L>, log: &ConversationLog) {
    let event = ServerEvent::UpdateConversation {
        messages: log.snapshot(),
    };
    for (_, session) in registry.iter() {
        session.link().deliver(event.clone());
    }
}
