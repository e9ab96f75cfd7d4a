//! 网关生命周期
//!
//! STOPPED -> STARTING -> RUNNING -> STOPPING -> STOPPED。
//! 启动时绑定监听、启动HTTP服务和定时健康巡检；停止时两者一起取消

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::business::domain::LifecycleState;
use crate::business::GatewayContext;
use crate::presentation::create_routes;
use crate::shared::AppResult;

/// 网关实例
pub struct Gateway {
    context: GatewayContext,
    shutdown: Option<watch::Sender<bool>>,
    server_task: Option<JoinHandle<()>>,
    monitor_task: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl Gateway {
    pub fn new(context: GatewayContext) -> Self {
        Self {
            context,
            shutdown: None,
            server_task: None,
            monitor_task: None,
            local_addr: None,
        }
    }

    pub fn context(&self) -> &GatewayContext {
        &self.context
    }

    pub async fn state(&self) -> LifecycleState {
        self.context.lifecycle_state().await
    }

    /// 实际监听地址，未启动时为 None
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// 定时巡检任务是否仍在运行
    pub fn is_monitor_active(&self) -> bool {
        self.monitor_task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// 启动网关，已在运行时不做任何事
    pub async fn start(&mut self) -> AppResult<()> {
        {
            let mut state = self.context.lifecycle.write().await;
            if *state != LifecycleState::Stopped {
                warn!("⚠️ 网关已处于 {} 状态，忽略重复启动", *state);
                return Ok(());
            }
            *state = LifecycleState::Starting;
        }

        let address = self.context.config.bind_address();
        let listener = match TcpListener::bind(&address).await {
            Ok(listener) => listener,
            Err(e) => {
                *self.context.lifecycle.write().await = LifecycleState::Stopped;
                return Err(crate::internal_error!("无法监听 {}: {}", address, e));
            }
        };
        let local_addr = listener
            .local_addr()
            .map_err(|e| crate::internal_error!("无法获取监听地址: {}", e))?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let app = create_routes(self.context.clone());
        let mut server_shutdown = shutdown_rx.clone();
        let server_task = tokio::spawn(async move {
            let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .tcp_nodelay(true)
                .with_graceful_shutdown(async move {
                    let _ = server_shutdown.wait_for(|stop| *stop).await;
                    info!("🛑 接收到关闭信号，正在优雅关闭服务器...");
                });
            if let Err(e) = server.await {
                error!("❌ HTTP 服务异常退出: {}", e);
            }
        });

        let monitor_task = self.spawn_health_monitor(shutdown_rx);

        self.shutdown = Some(shutdown_tx);
        self.server_task = Some(server_task);
        self.monitor_task = Some(monitor_task);
        self.local_addr = Some(local_addr);

        *self.context.lifecycle.write().await = LifecycleState::Running;
        info!("🌐 网关启动成功，监听地址: {}", local_addr);
        for service in self.context.registry.services() {
            info!("  ↳ {} -> {}", service.name, service.base_url());
        }

        Ok(())
    }

    /// 定时巡检：首轮在一个周期之后触发，收到停止信号即退出
    fn spawn_health_monitor(&self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let context = self.context.clone();
        let period = Duration::from_secs(context.config.health.interval_seconds.max(1));

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        context.health.run_scheduled_sweep().await;
                        context.rate_limiter.cleanup_expired_records().await;
                    }
                    _ = async { let _ = shutdown.wait_for(|stop| *stop).await; } => {
                        info!("🏥 定时健康巡检已停止");
                        break;
                    }
                }
            }
        })
    }

    /// 停止网关，未运行时不做任何事
    pub async fn stop(&mut self) -> AppResult<()> {
        {
            let mut state = self.context.lifecycle.write().await;
            if *state != LifecycleState::Running {
                warn!("⚠️ 网关处于 {} 状态，无需停止", *state);
                return Ok(());
            }
            *state = LifecycleState::Stopping;
        }

        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }

        if let Some(task) = self.monitor_task.take() {
            if let Err(e) = task.await {
                warn!("⚠️ 健康巡检任务退出异常: {}", e);
            }
        }
        if let Some(task) = self.server_task.take() {
            if let Err(e) = task.await {
                warn!("⚠️ HTTP 服务任务退出异常: {}", e);
            }
        }

        self.local_addr = None;
        *self.context.lifecycle.write().await = LifecycleState::Stopped;
        info!("✅ 网关已停止");

        Ok(())
    }
}
