pub mod register_member;
