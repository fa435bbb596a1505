pub mod customer_repo;
pub mod expense_category_repo;
pub mod expense_repo;
pub mod invoice_repo;
pub mod loyalty_repo;
pub mod order_repo;
pub mod payment_repo;
pub mod product_repo;
pub mod purchase_order_repo;
pub mod receipt_repo;
pub mod report_repo;
pub mod role_repo;
pub mod session_repo;
pub mod settings_repo;
pub mod shipment_repo;
pub mod user_repo;
pub mod vendor_repo;

pub use customer_repo::CustomerRepo;
pub use expense_category_repo::ExpenseCategoryRepo;
pub use expense_repo::ExpenseRepo;
pub use invoice_repo::InvoiceRepo;
pub use loyalty_repo::LoyaltyRepo;
pub use order_repo::OrderRepo;
pub use payment_repo::PaymentRepo;
pub use product_repo::ProductRepo;
pub use purchase_order_repo::PurchaseOrderRepo;
pub use receipt_repo::ReceiptRepo;
pub use report_repo::ReportRepo;
pub use role_repo::RoleRepo;
pub use session_repo::SessionRepo;
pub use settings_repo::SettingsRepo;
pub use shipment_repo::ShipmentRepo;
pub use user_repo::UserRepo;
pub use vendor_repo::VendorRepo;
