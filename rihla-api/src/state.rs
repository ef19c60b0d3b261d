use std::sync::Arc;

use tokio::sync::broadcast;

use rihla_booking::allocator::BookingAllocator;
use rihla_booking::lifecycle::LifecycleManager;
use rihla_booking::payment::PaymentProcessor;
use rihla_booking::repository::{BookingRepository, PaymentRepository};
use rihla_shared::models::events::BookingEvent;
use rihla_store::MemoryStore;
use rihla_transit::repository::TripRepository;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub trips: Arc<dyn TripRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub allocator: Arc<BookingAllocator>,
    pub lifecycle: Arc<LifecycleManager>,
    pub payment_processor: Arc<PaymentProcessor>,
    pub events: broadcast::Sender<BookingEvent>,
    pub auth: AuthConfig,
}

impl AppState {
    /// Wire every service around one shared store.
    pub fn build(store: Arc<MemoryStore>, auth: AuthConfig) -> Self {
        let trips: Arc<dyn TripRepository> = store.clone();
        let bookings: Arc<dyn BookingRepository> = store.clone();
        let payments: Arc<dyn PaymentRepository> = store.clone();

        let allocator = Arc::new(BookingAllocator::new(trips.clone(), bookings.clone()));
        let lifecycle = Arc::new(LifecycleManager::new(bookings.clone(), trips.clone()));
        let payment_processor = Arc::new(PaymentProcessor::new(
            bookings.clone(),
            payments.clone(),
            lifecycle.clone(),
        ));

        let (events, _) = broadcast::channel(100);

        Self {
            trips,
            bookings,
            payments,
            allocator,
            lifecycle,
            payment_processor,
            events,
            auth,
        }
    }
}
