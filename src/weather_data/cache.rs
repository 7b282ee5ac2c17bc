//! One parquet file per (year, station) holding that station's observations for the year.

use crate::weather_data::error::WeatherDataError;
use log::info;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tokio::{fs, task};

pub struct ObservationCache {
    dir: PathBuf,
}

impl ObservationCache {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn path_for(&self, year: i32, station: &str) -> PathBuf {
        self.dir.join(format!("{year}_{station}.parquet"))
    }

    /// Returns the cached frame, or `None` on a cache miss.
    pub async fn read(
        &self,
        year: i32,
        station: &str,
    ) -> Result<Option<DataFrame>, WeatherDataError> {
        let path = self.path_for(year, station);
        if fs::metadata(&path).await.is_err() {
            return Ok(None);
        }
        info!("Cache hit for station {} year {} at {:?}", station, year, path);

        task::spawn_blocking(move || {
            let file = std::fs::File::open(&path)
                .map_err(|e| WeatherDataError::CacheRead(path.clone(), e))?;
            ParquetReader::new(file)
                .finish()
                .map(Some)
                .map_err(|e| WeatherDataError::ParquetRead(path, e))
        })
        .await?
    }

    /// Writes the frame for (year, station). The file is written next to its final path and
    /// renamed into place, so a key always maps to one complete file.
    pub async fn write(
        &self,
        year: i32,
        station: &str,
        mut df: DataFrame,
    ) -> Result<(), WeatherDataError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| WeatherDataError::CacheDirCreation(self.dir.clone(), e))?;

        let path = self.path_for(year, station);
        let partial = path.with_extension("parquet.partial");
        let path_clone = path.clone();
        task::spawn_blocking(move || {
            let result = write_parquet(&partial, &path_clone, &mut df);
            if result.is_err() {
                let _ = std::fs::remove_file(&partial);
            }
            result
        })
        .await??;

        info!("Cached observations for station {} year {} to {:?}", station, year, path);
        Ok(())
    }
}

fn write_parquet(partial: &Path, path: &Path, df: &mut DataFrame) -> Result<(), WeatherDataError> {
    let file = std::fs::File::create(partial)
        .map_err(|e| WeatherDataError::ParquetWriteIo(partial.to_path_buf(), e))?;
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Snappy)
        .finish(df)
        .map_err(|e| WeatherDataError::ParquetWritePolars(partial.to_path_buf(), e))?;
    std::fs::rename(partial, path)
        .map_err(|e| WeatherDataError::ParquetWriteIo(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df!(
            "station" => ["72408013739", "72408013739"],
            "date" => ["2020-06-01T14:51:00", "2020-06-01T15:51:00"],
            "tmp" => [Some("+0250,1"), None],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_read_miss() -> Result<(), WeatherDataError> {
        let dir = tempfile::tempdir()?;
        let cache = ObservationCache::new(dir.path());
        assert!(cache.read(2020, "72408013739").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_write_then_read() -> Result<(), WeatherDataError> {
        let dir = tempfile::tempdir()?;
        let cache = ObservationCache::new(&dir.path().join("station_data"));
        cache.write(2020, "72408013739", frame()).await?;

        assert!(cache.path_for(2020, "72408013739").ends_with("2020_72408013739.parquet"));
        let read = cache.read(2020, "72408013739").await?.expect("cached frame");
        assert!(read.equals_missing(&frame()));
        assert!(cache.read(2021, "72408013739").await?.is_none());

        // Rewriting the same key replaces the file.
        cache.write(2020, "72408013739", frame()).await?;
        let again = cache.read(2020, "72408013739").await?.expect("cached frame");
        assert!(again.equals_missing(&frame()));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_write_removes_partial_file() -> Result<(), WeatherDataError> {
        let dir = tempfile::tempdir()?;
        let cache = ObservationCache::new(dir.path());
        // A non-empty directory at the final path makes the rename fail.
        let blocked = cache.path_for(2020, "72408013739");
        std::fs::create_dir_all(blocked.join("occupied"))?;

        let result = cache.write(2020, "72408013739", frame()).await;
        assert!(matches!(result, Err(WeatherDataError::ParquetWriteIo(_, _))));
        assert!(!blocked.with_extension("parquet.partial").exists());
        Ok(())
    }
}
