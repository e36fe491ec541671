pub mod customer;
pub mod discount;
pub mod invoice;
pub mod payment;
pub mod plan;
pub mod product;
pub mod subscription;
pub mod tax;
pub mod user;

pub use customer::{CreateCustomer, Customer, CustomerWithUser, UpdateCustomer};
pub use discount::{CreateDiscount, Discount, UpdateDiscount};
pub use invoice::{CreateInvoice, Invoice, InvoiceStatus, InvoiceWithCustomerRow, UpdateInvoice};
pub use payment::{CreatePayment, Payment, PaymentMethod, PaymentWithInvoiceRow, UpdatePayment};
pub use plan::{BillingPeriod, CreatePlan, PlanWithStats, RecurringPlan, UpdatePlan};
pub use product::{CreateProduct, Product, ProductType, ProductWithStats, UpdateProduct};
pub use subscription::{
    CreateSubscription, CreateSubscriptionLine, CustomerSubscriptionSummary, LineWithProductRow,
    Subscription, SubscriptionDetailRow, SubscriptionLine, SubscriptionStatus, UpdateSubscription,
};
pub use tax::{CreateTax, Tax, UpdateTax};
pub use user::{CreateUser, UpdateUser, User, UserRole};
