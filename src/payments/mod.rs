pub mod gateway;
pub mod paystack;

pub use gateway::{
    InitializeData, InitializeRequest, PaymentGateway, TransactionMetadata, VerifyData,
};
pub use paystack::PaystackClient;
