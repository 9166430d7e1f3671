//! 命令行入口

use anyhow::Context;
use clap::{Parser, Subcommand};
use kulu_bootstrap::{Infrastructure, check_health};
use kulu_common::{ListingId, UserId};

use crate::application::{Credentials, RegisterForm, SessionService};

/// Kulu İlan 命令行客户端
#[derive(Parser, Debug)]
#[command(name = "kulu")]
#[command(about = "Kulu İlan client: session, moderation and cache tools")]
#[command(version)]
pub struct Cli {
    /// 配置目录
    #[arg(long, default_value = "config")]
    pub config_dir: String,

    /// 结束时输出 Prometheus 格式的指标
    #[arg(long)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 注册新账号
    Register {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long)]
        password: String,
    },
    /// 登录并缓存当前用户
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// 清除当前用户
    Logout,
    /// 显示缓存中的当前用户
    Whoami,
    ApproveUser {
        user_id: String,
    },
    RejectUser {
        user_id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    ApproveListing {
        listing_id: String,
    },
    RejectListing {
        listing_id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    DeleteListing {
        listing_id: String,
    },
    /// 设置或取消推荐
    FeatureListing {
        listing_id: String,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        featured: bool,
    },
    /// 显示本机设备标识
    DeviceId,
    /// 检查各存储层
    Doctor,
}

/// 执行子命令
pub async fn execute(
    command: Command,
    service: &SessionService,
    infra: &Infrastructure,
) -> anyhow::Result<()> {
    match command {
        Command::Register {
            full_name,
            email,
            phone,
            password,
        } => {
            let form = RegisterForm {
                full_name,
                email,
                phone,
                password,
            };
            let user = service.register(&form).await.context("Registration failed")?;
            if user.is_approved() {
                println!("Registered and signed in as {} ({})", user.full_name, user.id);
            } else {
                println!(
                    "Registered {} ({}), status: {}",
                    user.full_name, user.id, user.status
                );
            }
        }
        Command::Login { email, password } => {
            let outcome = service
                .login(&Credentials { email, password })
                .await
                .context("Login failed")?;
            println!(
                "Signed in as {} ({}, {})",
                outcome.user.full_name, outcome.user.id, outcome.user.role
            );
            if !outcome.persisted {
                println!("Warning: session could not be saved and will not survive a restart");
            }
        }
        Command::Logout => {
            service.logout().await;
            println!("Signed out");
        }
        Command::Whoami => match service.current_user().await {
            Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
            None => println!("Not signed in"),
        },
        Command::ApproveUser { user_id } => {
            service.approve_user(&UserId::new(user_id)).await?;
            println!("User approved");
        }
        Command::RejectUser { user_id, reason } => {
            service
                .reject_user(&UserId::new(user_id), reason.as_deref())
                .await?;
            println!("User rejected");
        }
        Command::ApproveListing { listing_id } => {
            service.approve_listing(&ListingId::new(listing_id)).await?;
            println!("Listing approved");
        }
        Command::RejectListing { listing_id, reason } => {
            service
                .reject_listing(&ListingId::new(listing_id), reason.as_deref())
                .await?;
            println!("Listing rejected");
        }
        Command::DeleteListing { listing_id } => {
            service.delete_listing(&ListingId::new(listing_id)).await?;
            println!("Listing deleted");
        }
        Command::FeatureListing {
            listing_id,
            featured,
        } => {
            service
                .set_listing_featured(&ListingId::new(listing_id), featured)
                .await?;
            println!("Listing featured: {}", featured);
        }
        Command::DeviceId => {
            println!("{}", service.device_id_or_init().await);
        }
        Command::Doctor => {
            let status = check_health(infra).await;
            println!("{}", status);
            if !status.healthy {
                anyhow::bail!("one or more storage tiers are unhealthy");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reject_listing_with_reason() {
        let cli = Cli::try_parse_from([
            "kulu",
            "reject-listing",
            "l-42",
            "--reason",
            "duplicate",
        ])
        .unwrap();

        match cli.command {
            Command::RejectListing { listing_id, reason } => {
                assert_eq!(listing_id, "l-42");
                assert_eq!(reason.as_deref(), Some("duplicate"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.config_dir, "config");
    }

    #[test]
    fn test_feature_listing_can_unset() {
        let cli =
            Cli::try_parse_from(["kulu", "feature-listing", "l-1", "--featured", "false"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::FeatureListing { featured: false, .. }
        ));
    }

    #[test]
    fn test_login_requires_password() {
        assert!(Cli::try_parse_from(["kulu", "login", "--email", "a@b.c"]).is_err());
    }
}
