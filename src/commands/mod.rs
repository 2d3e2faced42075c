pub mod clone;
pub mod copy_from_unity;
pub mod doctor;
pub mod info;
pub mod init;
pub mod install;
pub mod link;
pub mod list;
pub mod publish;
pub mod sync;
pub mod uninstall;
pub mod update_template;
pub mod version;
