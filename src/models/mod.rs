pub mod friendship;
pub mod group;
pub mod restaurant;
pub mod user;

pub use friendship::{FriendDetail, FriendRequestDetail, Friendship, NewFriendship};
pub use group::{
    Group, GroupInviteDetail, GroupMember, GroupSummary, MemberDetail, NewGroup, NewGroupMember,
};
pub use restaurant::{NewRestaurant, Restaurant, RestaurantWithOwner, UpdateRestaurant};
pub use user::{NewUser, PublicUser, User};
