use std::time::{Duration, Instant};

use crossbeam::channel::{never, tick, Receiver};

use super::{Flow, Session, Trigger};
use crate::client::PersonApi;

/// Drives `session` until a `Quit` trigger arrives or every trigger sender
/// is gone.
///
/// A fetch is attempted immediately, then once per `poll_interval` for as
/// long as the session is polling. Each trigger runs to completion before the
/// next is received; triggers sent meanwhile wait in the channel.
pub fn run<A, R>(
    session: &mut Session<A>,
    triggers: &Receiver<Trigger>,
    poll_interval: Duration,
    mut render: R,
) where
    A: PersonApi,
    R: FnMut(&Session<A>),
{
    let idle: Receiver<Instant> = never();
    let mut ticker: Option<Receiver<Instant>> = None;

    session.handle(Trigger::Tick);
    render(session);

    loop {
        if session.polling() {
            ticker.get_or_insert_with(|| tick(poll_interval));
        } else {
            ticker = None;
        }

        let trigger = crossbeam::select! {
            recv(triggers) -> msg => match msg {
                Ok(trigger) => trigger,
                Err(_) => break,
            },
            recv(ticker.as_ref().unwrap_or(&idle)) -> _ => Trigger::Tick,
        };

        let flow = session.handle(trigger);
        render(session);
        if flow == Flow::Quit {
            break;
        }
    }
    tracing::debug!("dashboard loop finished");
}
