pub mod audit;
pub mod authorization;
pub mod health;
pub mod invitations;
pub mod roles;
pub mod users;
