//! Domain response codes.
//!
//! Several distinct business rules share one HTTP-like status (mostly 409
//! and 404). The numeric code travels next to the status in every response
//! so clients can tell the causes apart. Values are stable; never renumber.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainCode {
    // 403
    NotClubLeader,

    // 404
    ClubNotFound,
    RecruitmentNotFound,

    // 409
    LeaderNotInMembers,
    StudentNotFound,
    LeaderAlreadyExists,
    NameDuplicate,
    LocationDuplicate,
    AlreadyMember,
    NotMember,
    CannotRemoveLeader,
    SameLeader,
    NewLeaderNotMember,
    RecruitmentAlreadyOpen,
    NoCurrentRecruitment,
}

impl DomainCode {
    pub fn value(self) -> i32 {
        match self {
            DomainCode::NotClubLeader => 4031,

            DomainCode::ClubNotFound => 4041,
            DomainCode::RecruitmentNotFound => 4042,

            DomainCode::LeaderNotInMembers => 4091,
            DomainCode::StudentNotFound => 4092,
            DomainCode::LeaderAlreadyExists => 4093,
            DomainCode::NameDuplicate => 4094,
            DomainCode::LocationDuplicate => 4095,
            DomainCode::AlreadyMember => 4096,
            DomainCode::NotMember => 4097,
            DomainCode::CannotRemoveLeader => 4098,
            DomainCode::SameLeader => 4099,
            DomainCode::NewLeaderNotMember => 4100,
            DomainCode::RecruitmentAlreadyOpen => 4101,
            DomainCode::NoCurrentRecruitment => 4102,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn codes_are_unique() {
        let all = [
            DomainCode::NotClubLeader,
            DomainCode::ClubNotFound,
            DomainCode::RecruitmentNotFound,
            DomainCode::LeaderNotInMembers,
            DomainCode::StudentNotFound,
            DomainCode::LeaderAlreadyExists,
            DomainCode::NameDuplicate,
            DomainCode::LocationDuplicate,
            DomainCode::AlreadyMember,
            DomainCode::NotMember,
            DomainCode::CannotRemoveLeader,
            DomainCode::SameLeader,
            DomainCode::NewLeaderNotMember,
            DomainCode::RecruitmentAlreadyOpen,
            DomainCode::NoCurrentRecruitment,
        ];
        let values: HashSet<i32> = all.iter().map(|c| c.value()).collect();
        assert_eq!(values.len(), all.len());
    }
}
