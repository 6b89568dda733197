use relay::{Delivery, ResponseWriter};

/// A delivery together with the reply capability the transport bound to it.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub delivery: Delivery,
    pub writer: ResponseWriter,
}

impl Inbound {
    pub fn new(delivery: Delivery, writer: ResponseWriter) -> Self {
        let writer = writer.with_delivery(&delivery);
        Self { delivery, writer }
    }
}
