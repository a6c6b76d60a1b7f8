//! Action handlers: UpdateAction dispatch and background task spawning
//!
//! Every action runs as a tokio task that reports back with a [`Message`].
//! Nothing here touches the state; staleness is checked when the reply is
//! processed.

use shovel_client::{FlowApi, ListFlowsQuery};
use shovel_core::prelude::*;
use tokio::sync::mpsc;

use crate::handler::UpdateAction;
use crate::message::Message;

/// Execute an action by spawning a background task
pub fn handle_action<A>(action: UpdateAction, api: &A, msg_tx: mpsc::Sender<Message>)
where
    A: FlowApi + Clone + Send + Sync + 'static,
{
    match action {
        UpdateAction::FetchPage(request) => {
            let api = api.clone();
            tokio::spawn(async move {
                let query = ListFlowsQuery::new(&request.filter, request.cursor);
                let msg = match api.list_flows(&query).await {
                    Ok(page) => Message::FlowPageLoaded { request, page },
                    Err(e) => Message::FlowPageFailed {
                        request,
                        error: e.to_string(),
                    },
                };
                let _ = reply(&msg_tx, msg).await.context("Dropped flow page");
            });
        }

        UpdateAction::FetchFlowDetail { id } => {
            let api = api.clone();
            tokio::spawn(async move {
                let detail = match api.get_flow(id).await {
                    Ok(detail) => detail,
                    Err(e) => {
                        warn!("Failed to fetch flow {}: {}", id, e);
                        None
                    }
                };
                let msg = Message::FlowDetailLoaded {
                    id,
                    detail: detail.map(Box::new),
                };
                let _ = reply(&msg_tx, msg)
                    .await
                    .with_context(|| format!("Dropped detail for flow {id}"));
            });
        }
    }
}

/// Deliver a task result to the engine.
async fn reply(msg_tx: &mpsc::Sender<Message>, msg: Message) -> Result<()> {
    msg_tx
        .send(msg)
        .await
        .map_err(|_| Error::channel_send("engine stopped"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shovel_client::test_utils::MockFlowApi;
    use shovel_core::FlowId;

    #[tokio::test]
    async fn test_reply_to_stopped_engine_is_channel_error() {
        let (msg_tx, msg_rx) = mpsc::channel(1);
        drop(msg_rx);

        let err = reply(&msg_tx, Message::ScrollReachedEnd).await.unwrap_err();
        assert!(matches!(err, Error::ChannelSend { .. }));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_detail_reply_reaches_engine() {
        let api = MockFlowApi::default();
        let (msg_tx, mut msg_rx) = mpsc::channel(1);

        handle_action(UpdateAction::FetchFlowDetail { id: FlowId(9) }, &api, msg_tx);

        let msg = msg_rx.recv().await.unwrap();
        assert!(matches!(
            msg,
            Message::FlowDetailLoaded { id: FlowId(9), detail: None }
        ));
    }
}
