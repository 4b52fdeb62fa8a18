pub mod customer;
pub mod employee;
pub mod ticket;

pub use customer::{Customer, CustomerChanges, CustomerRow, NewCustomer};
pub use employee::{Employee, EmployeeChanges, EmployeeRow, NewEmployee};
pub use ticket::{NewTicket, Ticket, TicketMutation, TicketRow, DEFAULT_TICKET_TYPE};
