use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    Mutex,
};

use crate::db_types::OrderNumber;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("The reconciliation queue is full. Order {0} was not enqueued")]
    Full(OrderNumber),
    #[error("The reconciliation queue has been closed")]
    Closed,
}

/// Creates a bounded many-producer, many-consumer queue of order numbers.
///
/// The queue closes once every producer has been dropped and the remaining items have been consumed.
pub fn reconciliation_queue(capacity: usize) -> (QueueProducer, QueueConsumer) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let producer = QueueProducer { sender };
    let consumer = QueueConsumer { receiver: Arc::new(Mutex::new(receiver)) };
    (producer, consumer)
}

#[derive(Debug, Clone)]
pub struct QueueProducer {
    sender: mpsc::Sender<OrderNumber>,
}

impl QueueProducer {
    /// Adds an order number to the queue, waiting for a free slot if the queue is full.
    pub async fn enqueue(&self, number: OrderNumber) -> Result<(), QueueError> {
        self.sender.send(number).await.map_err(|_| QueueError::Closed)
    }

    /// Adds an order number to the queue if there is room for it right now. A full queue hands the order number
    /// back in [`QueueError::Full`].
    pub fn try_enqueue(&self, number: OrderNumber) -> Result<(), QueueError> {
        self.sender.try_send(number).map_err(|e| match e {
            TrySendError::Full(n) => QueueError::Full(n),
            TrySendError::Closed(_) => QueueError::Closed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// The receiving end of the queue. Clones share the same underlying receiver, so each order number is delivered to
/// exactly one consumer.
#[derive(Debug, Clone)]
pub struct QueueConsumer {
    receiver: Arc<Mutex<mpsc::Receiver<OrderNumber>>>,
}

impl QueueConsumer {
    /// Waits for the next order number. Returns `None` once the queue is closed and empty.
    pub async fn dequeue(&self) -> Option<OrderNumber> {
        self.receiver.lock().await.recv().await
    }
}
