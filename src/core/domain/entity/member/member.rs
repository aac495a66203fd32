use thiserror::Error;

use crate::core::domain::command::CommandError;
use crate::core::domain::entity::member::Member;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemberValidationError {
    #[error("member id must not be empty")]
    EmptyId,
    #[error("money must not be negative: {0}")]
    NegativeMoney(i64),
}

impl From<MemberValidationError> for CommandError {
    fn from(value: MemberValidationError) -> Self {
        CommandError::ValidationError {
            details: value.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnvalidatedMember {
    pub member_id: String,
    pub money: i64,
}

impl TryFrom<UnvalidatedMember> for Member {
    type Error = MemberValidationError;

    fn try_from(value: UnvalidatedMember) -> Result<Self, Self::Error> {
        let member_id = validate_member_id(value.member_id.trim())?;
        Ok(Member {
            member_id: member_id.to_string(),
            money: validate_money(value.money)?,
        })
    }
}

pub fn validate_member_id(member_id: &str) -> Result<&str, MemberValidationError> {
    if member_id.trim().is_empty() {
        return Err(MemberValidationError::EmptyId);
    }
    Ok(member_id)
}

pub fn validate_money(money: i64) -> Result<i64, MemberValidationError> {
    if money < 0 {
        return Err(MemberValidationError::NegativeMoney(money));
    }
    Ok(money)
}
