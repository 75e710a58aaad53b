use std::sync::{Arc, Mutex};

use chainfs::{BlockDevice, ChainFs};

pub struct ChainFuse<B: BlockDevice> {
    pub state: Arc<Mutex<ChainFs<B>>>,
}

impl<B: BlockDevice> ChainFuse<B> {
    #[must_use]
    pub fn new(fs: ChainFs<B>) -> Self {
        Self {
            state: Arc::new(Mutex::new(fs)),
        }
    }
}
