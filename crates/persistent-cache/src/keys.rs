//! 存储键常量

/// 当前登录用户
pub const USER_STORAGE_KEY: &str = "kulu_ilan_user";

/// 管理员标记
pub const ADMIN_FLAG_KEY: &str = "kulu_ilan_is_admin";

/// 设备标识
pub const DEVICE_ID_KEY: &str = "kulu_ilan_device_id";
