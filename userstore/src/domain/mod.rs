//! Domain records, validation schemas, and repository ports.
//!
//! Purpose: define the strongly typed entities of the user-management data
//! layer and the ports persistence adapters implement. Records stay plain
//! data; every invariant is enforced by a fallible constructor, and all
//! persistence behaviour lives behind the traits in [`ports`].
//!
//! Public surface:
//! - User (alias to `user::User`) — stored user record.
//! - Profile (alias to `profile::Profile`) — profile owned by a user.
//! - Role (alias to `role::Role`) — subscription tier enumeration.
//! - RepositoryError (alias to `ports::RepositoryError`) — persistence
//!   error taxonomy shared by every port.

pub mod criteria;
pub mod ports;
pub mod profile;
pub mod role;
pub mod user;

pub use self::criteria::{FieldError, ProfileCriteria, ProfileUpdate, UserCriteria, UserUpdate};
pub use self::ports::{EntityRepository, ProfileRepository, RepositoryError, UserRepository};
pub use self::profile::{NewProfile, Profile, ProfileDraft, ProfileId, ProfileParts};
pub use self::role::{ParseRoleError, Role};
pub use self::user::{Email, NewUser, User, UserDraft, UserId, UserValidationError, Username};
