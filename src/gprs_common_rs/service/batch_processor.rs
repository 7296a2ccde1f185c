use super::gprs_service::{invalid, DispatchOutcome, GprsService};
use crate::gprs_common_rs::decoder::{PacketClassifier, StructDecoder};
use crate::gprs_common_rs::packet::core::exceptions::{GprsPacketError, GprsResult};
use crate::gprs_common_rs::packet::core::packet_input::PacketInput;
use futures::future::join_all;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchStats {
    pub reports: usize,
    pub not_command: usize,
    pub invalid: usize,
    pub failed: usize,
}

impl BatchStats {
    pub fn from_results(results: &[GprsResult<DispatchOutcome>]) -> Self {
        let mut stats = BatchStats::default();
        for result in results {
            match result {
                Ok(DispatchOutcome::Report(_)) => stats.reports += 1,
                Ok(DispatchOutcome::NotCommand(_)) => stats.not_command += 1,
                Ok(DispatchOutcome::Invalid(_)) => stats.invalid += 1,
                Err(_) => stats.failed += 1,
            }
        }
        stats
    }
}

/// 複数パケットを並行に処理する
///
/// パケット同士は独立。同時実行数はセマフォで制限し、デコードは
/// ブロッキングスレッド上でタイムアウト付きで実行する。結果は入力順。
///
/// タイムアウトは結果を待つのをやめるだけで、実行中のデコードは中断されず
/// ブロッキングプール上で最後まで走る。
pub struct BatchProcessor<C, D> {
    service: Arc<GprsService<C, D>>,
    semaphore: Arc<Semaphore>,
    decode_timeout: Duration,
}

impl<C, D> BatchProcessor<C, D>
where
    C: PacketClassifier + 'static,
    D: StructDecoder + 'static,
{
    pub fn new(service: Arc<GprsService<C, D>>) -> Self {
        let config = service.config().clone();
        Self {
            service,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            decode_timeout: config.decode_timeout(),
        }
    }

    pub fn with_decode_timeout(mut self, decode_timeout: Duration) -> Self {
        self.decode_timeout = decode_timeout;
        self
    }

    pub async fn process_all(&self, inputs: Vec<PacketInput>) -> Vec<GprsResult<DispatchOutcome>> {
        debug!("batch: processing {} packets", inputs.len());
        let handles: Vec<_> = inputs
            .into_iter()
            .map(|input| {
                let service = Arc::clone(&self.service);
                let semaphore = Arc::clone(&self.semaphore);
                let decode_timeout = self.decode_timeout;
                tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => return Err(GprsPacketError::Io(e.to_string())),
                    };
                    process_one(service, input, decode_timeout).await
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| match joined {
                Ok(result) => result,
                Err(e) => Err(GprsPacketError::Io(format!("packet task failed: {}", e))),
            })
            .collect()
    }
}

async fn process_one<C, D>(
    service: Arc<GprsService<C, D>>,
    input: PacketInput,
    decode_timeout: Duration,
) -> GprsResult<DispatchOutcome>
where
    C: PacketClassifier + 'static,
    D: StructDecoder + 'static,
{
    let bytes = match input.normalize() {
        Ok(bytes) => bytes,
        Err(err) => return Ok(invalid(err)),
    };
    if let Some(outcome) = service.gate(&bytes) {
        return Ok(outcome);
    }

    let decoder = Arc::clone(&service);
    let decoded = timeout(decode_timeout, tokio::task::spawn_blocking(move || decoder.decode(&bytes))).await;
    match decoded {
        Ok(Ok(decoded)) => service.complete(decoded),
        Ok(Err(e)) => Err(GprsPacketError::Io(format!("decode task failed: {}", e))),
        Err(_) => {
            warn!("decode timed out after {:?}", decode_timeout);
            Err(GprsPacketError::Timeout(decode_timeout.as_millis() as u64))
        }
    }
}
